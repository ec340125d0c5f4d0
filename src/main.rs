use anyhow::Context;
use desk_scene::{DeskSceneApp, SceneConfig};

/// Environment variable naming an optional JSON scene config
const CONFIG_ENV: &str = "DESK_SCENE_CONFIG";

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::var_os(CONFIG_ENV) {
        Some(path) => {
            log::info!("Using scene config {}", path.to_string_lossy());
            SceneConfig::from_json_file(&path)?
        }
        None => SceneConfig::default(),
    };

    DeskSceneApp::new(config)
        .context("failed to start the desk scene")?
        .run()?;
    Ok(())
}
