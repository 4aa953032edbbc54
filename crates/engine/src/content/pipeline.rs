use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};

use crate::AppPaths;

use super::compiler::{compile_mission_document, ContentCompileError};
use super::database::MissionDatabase;
use super::discovery::{discover_missions, is_valid_mission_id, mission_file_path};

#[derive(Debug, Error)]
pub enum MissionLoadError {
    #[error("invalid mission id '{mission_id}'; use lowercase letters, digits, '_' or '-'")]
    InvalidMissionId { mission_id: String },
    #[error(
        "mission '{mission_id}' not found at {}; available missions: [{}]",
        path.display(),
        available.join(", ")
    )]
    NotFound {
        mission_id: String,
        path: PathBuf,
        available: Vec<String>,
    },
    #[error("failed to read mission file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Compile(#[from] ContentCompileError),
}

pub fn load_mission(
    app_paths: &AppPaths,
    mission_id: &str,
) -> Result<MissionDatabase, MissionLoadError> {
    if !is_valid_mission_id(mission_id) {
        return Err(MissionLoadError::InvalidMissionId {
            mission_id: mission_id.to_string(),
        });
    }

    let path = mission_file_path(&app_paths.missions_dir, mission_id);
    if !path.is_file() {
        let available = match discover_missions(&app_paths.missions_dir) {
            Ok(sources) => sources.into_iter().map(|source| source.mission_id).collect(),
            Err(error) => {
                warn!(
                    missions_dir = %app_paths.missions_dir.display(),
                    error = %error,
                    "mission_discovery_failed"
                );
                Vec::new()
            }
        };
        return Err(MissionLoadError::NotFound {
            mission_id: mission_id.to_string(),
            path,
            available,
        });
    }

    let raw = fs::read_to_string(&path).map_err(|source| MissionLoadError::Read {
        path: path.clone(),
        source,
    })?;
    let database = compile_mission_document(mission_id, &path, &raw)?;
    info!(
        mission_id,
        path = %path.display(),
        scenes = database.scenes().len(),
        paths = database.paths().len(),
        "mission_loaded"
    );
    Ok(database)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::TempDir;

    use super::*;
    use crate::content::ContentErrorCode;

    fn setup_app_paths(root: &Path) -> AppPaths {
        let missions = root.join("assets").join("missions");
        let saves = root.join("saves");
        fs::create_dir_all(&missions).expect("missions");
        fs::create_dir_all(&saves).expect("saves");
        AppPaths {
            root: root.to_path_buf(),
            missions_dir: missions,
            saves_dir: saves,
        }
    }

    fn shipped_missions_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("assets")
            .join("missions")
    }

    #[test]
    fn loads_mission_from_missions_dir() {
        let temp = TempDir::new().expect("temp");
        let app = setup_app_paths(temp.path());
        fs::write(
            app.missions_dir.join("alley.xml"),
            r#"<Mission><SceneDef>
                <defName>alley</defName>
                <cameraPosition>0 1.6 0</cameraPosition>
                <cameraLookAt>0 1.6 -10</cameraLookAt>
                <spawns><li><kind>crawler</kind><position>0 0 -8</position></li></spawns>
            </SceneDef></Mission>"#,
        )
        .expect("write");

        let db = load_mission(&app, "alley").expect("load");
        assert_eq!(db.mission_id(), "alley");
        assert_eq!(db.scenes().len(), 1);
    }

    #[test]
    fn missing_mission_lists_available_ones() {
        let temp = TempDir::new().expect("temp");
        let app = setup_app_paths(temp.path());
        fs::write(app.missions_dir.join("docks.xml"), "<Mission/>").expect("write");

        match load_mission(&app, "city") {
            Err(MissionLoadError::NotFound { available, .. }) => {
                assert_eq!(available, vec!["docks".to_string()]);
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn path_like_ids_are_rejected_before_touching_disk() {
        let temp = TempDir::new().expect("temp");
        let app = setup_app_paths(temp.path());
        assert!(matches!(
            load_mission(&app, "../secrets"),
            Err(MissionLoadError::InvalidMissionId { .. })
        ));
    }

    #[test]
    fn compile_errors_carry_the_file_path() {
        let temp = TempDir::new().expect("temp");
        let app = setup_app_paths(temp.path());
        fs::write(app.missions_dir.join("broken.xml"), "<Mission>").expect("write");
        match load_mission(&app, "broken") {
            Err(MissionLoadError::Compile(error)) => {
                assert_eq!(error.code, ContentErrorCode::XmlMalformed);
                assert!(error.file_path.ends_with("broken.xml"));
            }
            other => panic!("expected compile error, got {other:?}"),
        }
    }

    #[test]
    fn shipped_city_mission_compiles() {
        let temp = TempDir::new().expect("temp");
        let app = setup_app_paths(temp.path());
        fs::copy(
            shipped_missions_dir().join("city.xml"),
            app.missions_dir.join("city.xml"),
        )
        .expect("copy shipped mission");

        let db = load_mission(&app, "city").expect("load");
        assert!(db.scenes().len() >= 2);
        assert!(db
            .scenes()
            .iter()
            .any(|scene| !scene.path_indices.is_empty()));
    }
}
