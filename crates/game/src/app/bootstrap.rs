use engine::{resolve_app_paths, LoopConfig, Scene, StartupError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::config::{load_gameplay_config, ConfigError};
use super::gameplay;

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Mummy Pietree Startup ===");

    let paths = resolve_app_paths()?;
    let gameplay_config = load_gameplay_config(&paths.config_dir)?;
    info!(
        starting_room = %gameplay_config.starting_room,
        transition_seconds = gameplay_config.room_transition.duration_seconds,
        "gameplay_config_ready"
    );

    Ok(AppWiring {
        config: LoopConfig::default(),
        scene: gameplay::build_scene(gameplay_config),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
