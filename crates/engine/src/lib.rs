use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod asset_keys;
pub mod content;

pub use app::{
    projected_half_size_px, run_app, vignette_attenuation, Aabb, AppError, Camera3D, Ease, Entity,
    EntityId, HudState, InputEvent, InputQueue, InputSnapshot, Lerp, LoopConfig, LoopMode,
    MoodBarVisual, NavRect, Plane, PostFx, Ray, RaycastHit, RenderableDesc, RenderableKind,
    Renderer, Scene, SceneQuery, SceneVisualState, SceneWorld, Tween, Vec2, Vec3, Viewport,
    CAMERA_EYE_OFFSET_DEFAULT, CAMERA_FOV_DEFAULT_RADIANS, PLACEHOLDER_HALF_SIZE_PX,
};
pub use asset_keys::{validate_asset_key, AssetKeyError};
pub use content::{
    compile_def_database, load_def_database, ContentCompileError, ContentErrorCode,
    ContentPipelineError, DefDatabase, ItemData, ItemDefId, PlantData, SourceLocation,
};

pub const ROOT_ENV_VAR: &str = "PIETREE_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub base_content_dir: PathBuf,
    pub config_dir: PathBuf,
}

impl AppPaths {
    pub fn from_root(root: PathBuf) -> Self {
        let assets = root.join("assets");
        Self {
            base_content_dir: assets.join("base"),
            config_dir: assets.join("config"),
            root,
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "PIETREE_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/mummy-pietree\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    resolve_root().map(AppPaths::from_root)
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(&PathBuf::from(value));
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            exe_dir
                .ancestors()
                .find(|candidate| is_repo_marker(candidate))
                .map(normalize_path)
                .ok_or_else(|| StartupError::RootNotFound {
                    start_dir: normalize_path(&exe_dir),
                    env_var: ROOT_ENV_VAR,
                })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn repo_marker_requires_cargo_toml() {
        let temp = TempDir::new().expect("temp");
        fs::create_dir_all(temp.path().join("assets")).expect("assets");
        assert!(!is_repo_marker(temp.path()));

        fs::write(temp.path().join("Cargo.toml"), "[workspace]\n").expect("write");
        assert!(is_repo_marker(temp.path()));
    }

    #[test]
    fn paths_derive_from_root() {
        let paths = AppPaths::from_root(PathBuf::from("/game"));
        assert_eq!(paths.base_content_dir, Path::new("/game/assets/base"));
        assert_eq!(paths.config_dir, Path::new("/game/assets/config"));
    }
}
