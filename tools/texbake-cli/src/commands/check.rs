//! Check that the renderer, template and directories are usable.

use std::path::Path;

use texbake_common::config::{config_file_path, ServiceConfig};
use texbake_render_engine::locate_executable;

pub fn run(config: &ServiceConfig) -> anyhow::Result<bool> {
    println!("texbake Check");
    println!("{}", "=".repeat(50));

    let config_path = config_file_path();
    println!(
        "[INFO] Config file: {} ({})",
        config_path.display(),
        if config_path.exists() { "found" } else { "defaults" }
    );

    let mut ok = true;

    match config.validate() {
        Ok(()) => println!("[OK] Configuration is valid"),
        Err(e) => {
            println!("[FAIL] {e}");
            ok = false;
        }
    }

    match locate_executable(&config.renderer.executable) {
        Some(path) => println!("[OK] Renderer: {}", path.display()),
        None => {
            println!(
                "[FAIL] Renderer not found: {}",
                config.renderer.executable.display()
            );
            ok = false;
        }
    }

    ok &= report_path("Script template", &config.renderer.script_template, true);

    match config.renderer.resolved_working_dir() {
        Ok(dir) => println!("[OK] Working directory: {}", dir.display()),
        Err(e) => {
            println!("[FAIL] Working directory: {e}");
            ok = false;
        }
    }
    ok &= report_path("Scratch directory", &config.renderer.resolved_scratch_dir(), true);

    match config.inputs.base_url.as_deref().filter(|b| !b.is_empty()) {
        Some(base) => println!("[INFO] Inputs served from {base}"),
        None => {
            report_path("Models directory", &config.inputs.models_dir, false);
            report_path("Textures directory", &config.inputs.textures_dir, false);
        }
    }

    if config.output.dir.exists() {
        println!("[OK] Output directory: {}", config.output.dir.display());
    } else {
        println!(
            "[INFO] Output directory: {} (created on first render)",
            config.output.dir.display()
        );
    }

    println!(
        "[INFO] Remote: {}@{}:{} under {}",
        config.remote.username, config.remote.host, config.remote.port, config.remote.mount_prefix
    );
    if config.remote.password.is_none() && config.remote.private_key.is_none() {
        println!("[WARN] No remote credentials (set TEXBAKE_REMOTE_PASSWORD or TEXBAKE_REMOTE_KEY)");
    }

    println!();
    if ok {
        println!("All required components are available. texbake is ready.");
    } else {
        println!("Some required components are missing. See above.");
    }
    Ok(ok)
}

fn report_path(label: &str, path: &Path, required: bool) -> bool {
    if path.exists() {
        println!("[OK] {label}: {}", path.display());
        true
    } else {
        let tag = if required { "FAIL" } else { "WARN" };
        println!("[{tag}] {label} missing: {}", path.display());
        !required
    }
}
