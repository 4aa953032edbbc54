use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod content;

pub use app::{
    run_headless, run_headless_with_metrics, AppError, CameraPose, Collaborators, EnemyKind,
    GameSession, HudSnapshot, InputDriver, LeaderboardRecord, LeaderboardStore, LifecycleState,
    LoopConfig, LoopMetricsSnapshot, MetricsHandle, MissionOutcome, PlayerAction, PowerUpKind,
    Ray, RenderableDesc, RenderableId, RenderableKind, RunSummary, SceneGraph, SessionConfig,
    UiSink,
};
pub use content::{
    compile_mission_document, discover_missions, load_mission, ContentCompileError,
    ContentErrorCode, MissionDatabase, MissionLoadError, SourceLocation,
};

pub const ROOT_ENV_VAR: &str = "RAILGE_ROOT";
pub const SAVES_ENV_VAR: &str = "RAILGE_SAVES";

const MISSIONS_SUBDIR: [&str; 2] = ["assets", "missions"];
const SAVES_SUBDIR: &str = "saves";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub missions_dir: PathBuf,
    pub saves_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve search start directories: {0}")]
    SearchStart(#[source] std::io::Error),
    #[error("failed to create saves directory at {path}: {source}")]
    CreateSavesDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("RAILGE_ROOT={path} has no assets/missions directory")]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "no assets/missions directory found above {}; set RAILGE_ROOT to the game root",
        join_dirs(searched)
    )]
    RootNotFound { searched: Vec<PathBuf> },
}

impl AppPaths {
    pub fn under_root(root: PathBuf, saves_override: Option<PathBuf>) -> Result<Self, StartupError> {
        let missions_dir = missions_dir_of(&root);
        let saves_dir = saves_override.unwrap_or_else(|| root.join(SAVES_SUBDIR));
        fs::create_dir_all(&saves_dir).map_err(|source| StartupError::CreateSavesDir {
            path: saves_dir.clone(),
            source,
        })?;
        Ok(Self {
            root,
            missions_dir,
            saves_dir,
        })
    }
}

/// Resolves the game root from `RAILGE_ROOT`, else the nearest ancestor of the
/// working directory or the executable that ships `assets/missions`.
pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = match read_env_path(ROOT_ENV_VAR)? {
        Some(path) => {
            let path = normalize_path(&path);
            if !missions_dir_of(&path).is_dir() {
                return Err(StartupError::InvalidEnvRoot { path });
            }
            path
        }
        None => {
            let starts = search_starts()?;
            find_game_root(&starts).ok_or(StartupError::RootNotFound { searched: starts })?
        }
    };
    AppPaths::under_root(root, read_env_path(SAVES_ENV_VAR)?)
}

fn read_env_path(var: &'static str) -> Result<Option<PathBuf>, StartupError> {
    match env::var(var) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(PathBuf::from(value.trim()))),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(source) => Err(StartupError::EnvVar { var, source }),
    }
}

fn search_starts() -> Result<Vec<PathBuf>, StartupError> {
    let cwd = env::current_dir().map_err(StartupError::SearchStart)?;
    let exe = env::current_exe().map_err(StartupError::SearchStart)?;
    let mut starts = vec![cwd];
    if let Some(exe_dir) = exe.parent() {
        starts.push(exe_dir.to_path_buf());
    }
    Ok(starts)
}

fn find_game_root(starts: &[PathBuf]) -> Option<PathBuf> {
    starts
        .iter()
        .flat_map(|start| start.ancestors())
        .find(|candidate| missions_dir_of(candidate).is_dir())
        .map(normalize_path)
}

fn missions_dir_of(root: &Path) -> PathBuf {
    MISSIONS_SUBDIR
        .iter()
        .fold(root.to_path_buf(), |path, part| path.join(part))
}

fn join_dirs(dirs: &[PathBuf]) -> String {
    dirs.iter()
        .map(|dir| dir.display().to_string())
        .collect::<Vec<_>>()
        .join(" or ")
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn game_root() -> TempDir {
        let temp = TempDir::new().expect("temp");
        fs::create_dir_all(missions_dir_of(temp.path())).expect("missions");
        temp
    }

    #[test]
    fn nearest_ancestor_with_missions_wins() {
        let temp = game_root();
        let deep = temp.path().join("target").join("debug");
        fs::create_dir_all(&deep).expect("deep");

        let found = find_game_root(&[deep]).expect("root");
        assert_eq!(found, normalize_path(temp.path()));
    }

    #[test]
    fn later_starts_are_tried_when_earlier_ones_miss() {
        let elsewhere = TempDir::new().expect("temp");
        let temp = game_root();
        let found = find_game_root(&[
            elsewhere.path().to_path_buf(),
            temp.path().join("assets"),
        ]);
        assert_eq!(found, Some(normalize_path(temp.path())));
    }

    #[test]
    fn shipped_workspace_is_a_game_root() {
        let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let found = find_game_root(&[manifest.clone()]).expect("workspace root");
        assert!(normalize_path(&manifest).starts_with(&found));
    }

    #[test]
    fn saves_dir_is_created_and_can_be_overridden() {
        let temp = game_root();
        let paths = AppPaths::under_root(temp.path().to_path_buf(), None).expect("paths");
        assert!(paths.saves_dir.is_dir());
        assert!(paths.missions_dir.ends_with(Path::new("assets").join("missions")));

        let custom = temp.path().join("profiles").join("p1");
        let paths = AppPaths::under_root(temp.path().to_path_buf(), Some(custom.clone()))
            .expect("paths");
        assert_eq!(paths.saves_dir, custom);
        assert!(custom.is_dir());
    }

    #[test]
    fn root_not_found_lists_search_starts() {
        let error = StartupError::RootNotFound {
            searched: vec![PathBuf::from("/a"), PathBuf::from("/b")],
        };
        let message = error.to_string();
        assert!(message.contains("/a or /b"));
        assert!(message.contains(ROOT_ENV_VAR));
    }
}
