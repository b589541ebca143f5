//! Bake textures onto a model from explicit paths.

use texbake_common::config::ServiceConfig;
use texbake_render_engine::RenderService;

pub async fn run(
    config: &ServiceConfig,
    model: String,
    textures: Vec<String>,
) -> anyhow::Result<bool> {
    config.validate()?;
    let service = RenderService::from_config(config)?;
    let outcome = service.render(model, textures).await;
    super::print_outcome(&outcome)
}
