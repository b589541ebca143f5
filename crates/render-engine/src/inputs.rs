//! Named inputs: resolving a ship model and texture date to concrete paths.

use std::path::Path;

use texbake_common::clock::is_date_token;
use texbake_common::config::InputConfig;
use texbake_common::error::{TexbakeError, TexbakeResult};
use texbake_job_model::RenderRequest;

/// Turns `(model name, date)` pairs into render requests.
///
/// With a base URL configured the renderer is handed URLs under
/// `<base>/model/` and `<base>/texture/<date>/`; otherwise local paths under
/// the configured model and texture directories.
#[derive(Debug, Clone)]
pub struct InputResolver {
    config: InputConfig,
}

impl InputResolver {
    pub fn new(config: InputConfig) -> Self {
        Self { config }
    }

    pub fn resolve_named(&self, ship_model: &str, texture_date: &str) -> TexbakeResult<RenderRequest> {
        validate_name(ship_model)?;
        if !is_date_token(texture_date) {
            return Err(TexbakeError::invalid_request(format!(
                "texture date must be 8 digits (YYYYMMDD), got {texture_date:?}"
            )));
        }

        let cfg = &self.config;
        let model_file = format!("{ship_model}.{}", cfg.model_extension);

        let request = match cfg.base_url.as_deref().filter(|b| !b.is_empty()) {
            Some(base) => {
                let base = base.trim_end_matches('/');
                RenderRequest::new(
                    format!("{base}/model/{model_file}"),
                    vec![
                        format!("{base}/texture/{texture_date}/{}", cfg.top_texture),
                        format!("{base}/texture/{texture_date}/{}", cfg.side_texture),
                    ],
                )
            }
            None => {
                // Relative directories are taken from the service's cwd, not
                // the renderer's.
                let cwd = std::env::current_dir()?;
                let date_dir = cwd.join(&cfg.textures_dir).join(texture_date);
                let request = RenderRequest::new(
                    path_string(&cwd.join(&cfg.models_dir).join(&model_file)),
                    vec![
                        path_string(&date_dir.join(&cfg.top_texture)),
                        path_string(&date_dir.join(&cfg.side_texture)),
                    ],
                );
                log_local_inputs(&request);
                request
            }
        };

        tracing::info!(
            model = %request.model_path,
            top = %request.texture_paths[0],
            side = %request.texture_paths[1],
            "Resolved named inputs"
        );
        Ok(request)
    }
}

fn validate_name(name: &str) -> TexbakeResult<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
    {
        return Err(TexbakeError::invalid_request(format!(
            "invalid model name {name:?}"
        )));
    }
    Ok(())
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn log_local_inputs(request: &RenderRequest) {
    for (role, path) in [
        ("model", request.model_path.as_str()),
        ("top", request.texture_paths[0].as_str()),
        ("side", request.texture_paths[1].as_str()),
    ] {
        tracing::debug!(role, path, exists = Path::new(path).exists(), "Input file check");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn local_config() -> InputConfig {
        InputConfig {
            models_dir: PathBuf::from("/data/models"),
            textures_dir: PathBuf::from("/data/textures"),
            ..InputConfig::default()
        }
    }

    #[test]
    fn resolves_local_paths() {
        let req = InputResolver::new(local_config())
            .resolve_named("02_chuizhi", "20250522")
            .unwrap();
        assert_eq!(req.model_path, "/data/models/02_chuizhi.ply");
        assert_eq!(
            req.texture_paths,
            vec![
                "/data/textures/20250522/top.jpg".to_string(),
                "/data/textures/20250522/side.jpg".to_string(),
            ]
        );
    }

    #[test]
    fn relative_dirs_resolve_to_absolute_paths() {
        let req = InputResolver::new(InputConfig::default())
            .resolve_named("hull", "20240101")
            .unwrap();
        let cwd = std::env::current_dir().unwrap();
        assert!(Path::new(&req.model_path).is_absolute());
        assert_eq!(PathBuf::from(&req.model_path), cwd.join("data/models/hull.ply"));
        assert_eq!(
            PathBuf::from(&req.texture_paths[0]),
            cwd.join("data/textures/20240101/top.jpg")
        );
    }

    #[test]
    fn resolves_urls_when_base_url_is_set() {
        let config = InputConfig {
            base_url: Some("http://172.14.10.218:8999/".to_string()),
            ..local_config()
        };
        let req = InputResolver::new(config)
            .resolve_named("02_chuizhi", "20250522")
            .unwrap();
        assert_eq!(req.model_path, "http://172.14.10.218:8999/model/02_chuizhi.ply");
        assert_eq!(
            req.texture_paths[1],
            "http://172.14.10.218:8999/texture/20250522/side.jpg"
        );
    }

    #[test]
    fn rejects_traversal_in_model_name() {
        let resolver = InputResolver::new(local_config());
        assert!(resolver.resolve_named("../etc/passwd", "20250522").is_err());
        assert!(resolver.resolve_named("..", "20250522").is_err());
        assert!(resolver.resolve_named("", "20250522").is_err());
    }

    #[test]
    fn rejects_malformed_dates() {
        let resolver = InputResolver::new(local_config());
        let err = resolver.resolve_named("hull", "2025-05-22").unwrap_err();
        assert_eq!(err.kind(), "invalid_request");
    }

    #[test]
    fn resolved_request_derives_expected_metadata() {
        use texbake_common::clock::FixedClock;
        use texbake_job_model::ExtractedMetadata;

        let req = InputResolver::new(local_config())
            .resolve_named("hull", "20240101")
            .unwrap();
        let clock = FixedClock::at(2025, 1, 1, 0, 0, 0).unwrap();
        let meta = ExtractedMetadata::extract(&req, &clock).unwrap();
        assert_eq!(meta.model_name, "hull");
        assert_eq!(meta.date_token, "20240101");
    }
}
