use thiserror::Error;
use tracing::info;

use crate::AppPaths;

use super::compiler::{compile_def_database, ContentCompileError};
use super::database::DefDatabase;

#[derive(Debug, Error)]
pub enum ContentPipelineError {
    #[error("base content directory is missing: {0}")]
    MissingBaseDir(std::path::PathBuf),
    #[error(transparent)]
    Compile(#[from] ContentCompileError),
}

/// Compiles every definition under the base content directory.
pub fn load_def_database(app_paths: &AppPaths) -> Result<DefDatabase, ContentPipelineError> {
    if !app_paths.base_content_dir.is_dir() {
        return Err(ContentPipelineError::MissingBaseDir(
            app_paths.base_content_dir.clone(),
        ));
    }
    let database = compile_def_database(&app_paths.base_content_dir)?;
    let plant_count = database.items().iter().filter(|item| item.is_plant()).count();
    info!(
        base_content_dir = %app_paths.base_content_dir.display(),
        item_count = database.len(),
        plant_count,
        "content_loaded"
    );
    Ok(database)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn app_paths(root: &std::path::Path) -> AppPaths {
        AppPaths {
            root: root.to_path_buf(),
            base_content_dir: root.join("assets").join("base"),
            config_dir: root.join("assets").join("config"),
        }
    }

    #[test]
    fn missing_base_dir_is_reported() {
        let temp = TempDir::new().expect("temp");
        let err = load_def_database(&app_paths(temp.path())).expect_err("err");
        assert!(matches!(err, ContentPipelineError::MissingBaseDir(_)));
    }

    #[test]
    fn loads_items_from_base_dir() {
        let temp = TempDir::new().expect("temp");
        let paths = app_paths(temp.path());
        fs::create_dir_all(paths.base_content_dir.join("defs")).expect("mkdir");
        fs::write(
            paths.base_content_dir.join("defs").join("items.xml"),
            r#"<Defs><ItemDef><defName>item.can</defName><label>Can</label><sprite>items/can</sprite></ItemDef></Defs>"#,
        )
        .expect("write");
        let db = load_def_database(&paths).expect("load");
        assert_eq!(db.len(), 1);
    }
}
