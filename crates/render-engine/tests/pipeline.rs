use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use regex::Regex;

use texbake_common::clock::FixedClock;
use texbake_common::config::ServiceConfig;
use texbake_common::error::{TexbakeError, TexbakeResult};
use texbake_job_model::JobOutcome;
use texbake_render_engine::{
    ExitReport, OutputStream, ProcessLauncher, RenderCommand, RenderExecutor, RenderOrchestrator,
};

/// What the stand-in renderer does with its output argument.
#[derive(Clone, Copy)]
enum Behavior {
    Write(&'static [u8]),
    WriteNothing,
    Exit(i32),
}

/// Stand-in renderer. Records every argument vector and whether the script
/// existed while it ran.
struct FakeRenderer {
    behavior: Behavior,
    calls: Mutex<Vec<Vec<String>>>,
    script_present: Mutex<Vec<bool>>,
}

impl FakeRenderer {
    fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: Mutex::new(Vec::new()),
            script_present: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProcessLauncher for FakeRenderer {
    fn launch(
        &self,
        command: &RenderCommand,
        sink: &mut dyn FnMut(OutputStream, &str),
    ) -> TexbakeResult<ExitReport> {
        let argv = command.argv();
        // [exe, --background, --python, script, --, model, top, side, output]
        let script = PathBuf::from(&argv[3]);
        let output = PathBuf::from(&argv[8]);
        self.script_present.lock().unwrap().push(script.exists());
        self.calls.lock().unwrap().push(argv);

        sink(OutputStream::Stdout, "Read blend: fake");
        let code = match self.behavior {
            Behavior::Write(bytes) => {
                std::fs::write(&output, bytes)?;
                0
            }
            Behavior::WriteNothing => 0,
            Behavior::Exit(code) => code,
        };
        Ok(ExitReport {
            code: Some(code),
            success: code == 0,
            output_lines: 1,
            elapsed: Duration::from_millis(1),
        })
    }
}

struct Harness {
    _dir: tempfile::TempDir,
    scratch: PathBuf,
    output: PathBuf,
    renderer: Arc<FakeRenderer>,
    orchestrator: RenderOrchestrator,
}

fn harness(behavior: Behavior) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let scratch = dir.path().join("scratch");
    let output = dir.path().join("output").join("models");
    std::fs::create_dir_all(&scratch).unwrap();

    let template = dir.path().join("texture_mapping.py");
    std::fs::write(&template, "import bpy\nimport sys\n").unwrap();

    let mut config = ServiceConfig::default();
    config.renderer.script_template = template;
    config.renderer.scratch_dir = Some(scratch.clone());
    config.output.dir = output.clone();

    let renderer = FakeRenderer::new(behavior);
    let executor = RenderExecutor::new("/opt/blender/blender", dir.path(), renderer.clone());
    let orchestrator = RenderOrchestrator::from_config(&config)
        .unwrap()
        .with_executor(executor)
        .with_clock(Arc::new(FixedClock::at(2025, 5, 22, 20, 47, 2).unwrap()));

    Harness {
        _dir: dir,
        scratch,
        output,
        renderer,
        orchestrator,
    }
}

fn textures() -> Vec<String> {
    vec![
        "/pan/20241216/JB14/top.jpg".to_string(),
        "/pan/20241216/JB14/side.jpg".to_string(),
    ]
}

fn entries(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(rd) => rd.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

#[test]
fn successful_job_yields_named_artifact_and_url() {
    let h = harness(Behavior::Write(b"glTF\x02\x00\x00\x00"));
    let reference = h
        .orchestrator
        .run("/data/models/02_chuizhi.ply", &textures())
        .unwrap();

    let pattern = Regex::new(r"^02_chuizhi_20241216_\d{8}_\d{6}\.glb$").unwrap();
    assert!(pattern.is_match(&reference.artifact_file_name));
    assert_eq!(reference.artifact_file_name, "02_chuizhi_20241216_20250522_204702.glb");
    assert_eq!(
        reference.model_url,
        "/models/02_chuizhi_20241216_20250522_204702.glb"
    );
    assert_eq!(reference.artifact.size_bytes, 8);
    assert!(reference.artifact.absolute_path.exists());

    let calls = h.renderer.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(&calls[0][..3], &["/opt/blender/blender", "--background", "--python"]);
    assert_eq!(calls[0][4], "--");
    assert_eq!(calls[0][5], "/data/models/02_chuizhi.ply");
    assert_eq!(calls[0][6..8], textures()[..]);
    assert!(*h.renderer.script_present.lock().unwrap().first().unwrap());

    assert!(entries(&h.scratch).is_empty(), "script instance left behind");
}

#[test]
fn too_few_textures_has_no_side_effects() {
    let h = harness(Behavior::Write(b"glTF"));
    let err = h
        .orchestrator
        .run("/data/models/hull.ply", &["/pan/20241216/top.jpg".to_string()])
        .unwrap_err();

    assert!(matches!(err, TexbakeError::InvalidRequest { .. }));
    assert!(h.renderer.calls().is_empty());
    assert!(!h.output.exists());
    assert!(entries(&h.scratch).is_empty());
}

#[test]
fn clean_exit_without_output_fails_validation() {
    let h = harness(Behavior::WriteNothing);
    let err = h
        .orchestrator
        .run("/data/models/hull.ply", &textures())
        .unwrap_err();

    assert_eq!(err.kind(), "output_validation");
    assert!(entries(&h.output).is_empty(), "placeholder output left behind");
    assert!(entries(&h.scratch).is_empty());
}

#[test]
fn clean_exit_with_empty_output_fails_validation() {
    let h = harness(Behavior::Write(b""));
    let err = h
        .orchestrator
        .run("/data/models/hull.ply", &textures())
        .unwrap_err();

    assert_eq!(err.kind(), "output_validation");
    assert!(entries(&h.output).is_empty());
}

#[test]
fn renderer_failure_reports_exit_code() {
    let h = harness(Behavior::Exit(3));
    let err = h
        .orchestrator
        .run("/data/models/hull.ply", &textures())
        .unwrap_err();

    match err {
        TexbakeError::RenderExecution { code } => assert_eq!(code, Some(3)),
        other => panic!("expected RenderExecution, got {other:?}"),
    }
    assert_eq!(h.renderer.calls().len(), 1);
    assert!(entries(&h.output).is_empty());
    assert!(entries(&h.scratch).is_empty());
}

#[test]
fn missing_template_fails_before_launch() {
    let h = harness(Behavior::Write(b"glTF"));
    let mut config = ServiceConfig::default();
    config.renderer.script_template = PathBuf::from("/nonexistent/texture_mapping.py");
    config.renderer.scratch_dir = Some(h.scratch.clone());
    config.output.dir = h.output.clone();

    let orchestrator = RenderOrchestrator::from_config(&config)
        .unwrap()
        .with_executor(RenderExecutor::new("blender", &h.scratch, h.renderer.clone()));
    let err = orchestrator
        .run("/data/models/hull.ply", &textures())
        .unwrap_err();

    assert_eq!(err.kind(), "script_provisioning");
    assert!(h.renderer.calls().is_empty());
}

#[test]
fn undated_textures_fall_back_to_clock_date() {
    let h = harness(Behavior::Write(b"glTF"));
    let reference = h
        .orchestrator
        .run(
            "hull.ply",
            &["top.jpg".to_string(), "side.jpg".to_string()],
        )
        .unwrap();
    assert_eq!(reference.artifact_file_name, "hull_20250522_20250522_204702.glb");
}

#[test]
fn concurrent_jobs_use_distinct_scripts_and_outputs() {
    let h = Arc::new(harness(Behavior::Write(b"glTF")));

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let h = Arc::clone(&h);
            std::thread::spawn(move || h.orchestrator.run("/data/models/hull.ply", &textures()))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|t| t.join().unwrap()).collect();

    let mut names: Vec<_> = results
        .iter()
        .map(|r| r.as_ref().unwrap().artifact_file_name.clone())
        .collect();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), 5);

    let mut scripts: Vec<_> = h.renderer.calls().iter().map(|argv| argv[3].clone()).collect();
    let launched = scripts.len();
    scripts.sort();
    scripts.dedup();
    assert_eq!(scripts.len(), launched);
    assert!(entries(&h.scratch).is_empty());
}

#[test]
fn outcome_json_shape() {
    let h = harness(Behavior::Exit(1));
    let outcome = JobOutcome::from(h.orchestrator.run("/data/models/hull.ply", &textures()));
    let json = serde_json::to_value(&outcome).unwrap();

    assert_eq!(json["success"], false);
    assert_eq!(json["error_kind"], "render_execution");
    assert!(json.get("model_url").is_none());
}

/// Removes service-relative directories created under the test's cwd.
#[cfg(unix)]
struct RelativeDirs(Vec<PathBuf>);

#[cfg(unix)]
impl Drop for RelativeDirs {
    fn drop(&mut self) {
        for dir in &self.0 {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}

#[cfg(unix)]
#[test]
fn relative_dirs_resolve_against_service_not_renderer_cwd() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    // Fails unless the script argument resolves from the renderer's cwd,
    // then writes to its last argument like the bake script does.
    let exe = dir.path().join("fake-blender");
    std::fs::write(
        &exe,
        "#!/bin/sh\ntest -f \"$3\" || exit 7\nfor last; do :; done\nprintf glTF > \"$last\"\n",
    )
    .unwrap();
    std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();

    let renderer_home = dir.path().join("renderer_home");
    std::fs::create_dir_all(&renderer_home).unwrap();
    let template = dir.path().join("texture_mapping.py");
    std::fs::write(&template, "import bpy\n").unwrap();

    let tag = std::process::id();
    let output = PathBuf::from(format!("pipeline_rel_out_{tag}"));
    let scratch = PathBuf::from(format!("pipeline_rel_scratch_{tag}"));
    let _cleanup = RelativeDirs(vec![output.clone(), scratch.clone()]);
    std::fs::create_dir_all(&scratch).unwrap();

    let mut config = ServiceConfig::default();
    config.renderer.executable = exe;
    config.renderer.script_template = template;
    config.renderer.working_dir = Some(renderer_home.clone());
    config.renderer.scratch_dir = Some(scratch.clone());
    config.renderer.timeout_secs = Some(30);
    config.output.dir = output.clone();

    let orchestrator = RenderOrchestrator::from_config(&config)
        .unwrap()
        .with_clock(Arc::new(FixedClock::at(2025, 5, 22, 20, 47, 2).unwrap()));
    let reference = orchestrator
        .run("/data/models/hull.ply", &textures())
        .unwrap();

    let artifact = output.join("hull_20241216_20250522_204702.glb");
    assert_eq!(std::fs::read(&artifact).unwrap(), b"glTF");
    assert_eq!(
        reference.artifact.absolute_path,
        artifact.canonicalize().unwrap()
    );
    assert!(entries(&renderer_home).is_empty(), "renderer wrote into its own cwd");
    assert!(entries(&scratch).is_empty(), "script instance left behind");
}
