mod compiler;
mod database;
mod pipeline;

pub use compiler::{compile_def_database, ContentCompileError, ContentErrorCode, SourceLocation};
pub use database::{DefDatabase, ItemData, ItemDefId, PlantData};
pub use pipeline::{load_def_database, ContentPipelineError};
