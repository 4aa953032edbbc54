mod compiler;
mod database;
mod discovery;
mod pipeline;

pub use compiler::{
    compile_mission_document, ContentCompileError, ContentErrorCode, SourceLocation,
};
pub use database::{
    MissionDatabase, PathDefinition, PowerUpPlacement, SceneDefinition, SceneSpawn, SpawnTrigger,
};
pub use discovery::{discover_missions, MissionSource};
pub use pipeline::{load_mission, MissionLoadError};
