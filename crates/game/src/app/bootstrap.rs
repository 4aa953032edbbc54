use std::env;

use rail_engine::{
    load_mission, resolve_app_paths, AppError, Collaborators, GameSession, LoopConfig,
    SessionConfig,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::autopilot::Autopilot;
use super::leaderboard::JsonFileLeaderboard;
use super::presentation::{ConsoleUi, LoggedSceneGraph};

pub(crate) const MISSION_ENV_VAR: &str = "RAILGE_MISSION";
pub(crate) const REALTIME_ENV_VAR: &str = "RAILGE_REALTIME";
const DEFAULT_MISSION: &str = "city";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) session: GameSession,
    pub(crate) driver: Autopilot,
}

pub(crate) fn build_app() -> Result<AppWiring, AppError> {
    init_tracing();
    info!("=== Rail Encounter Engine Startup ===");

    let app_paths = resolve_app_paths()?;
    info!(
        root = %app_paths.root.display(),
        missions_dir = %app_paths.missions_dir.display(),
        saves_dir = %app_paths.saves_dir.display(),
        "startup"
    );

    let mission_id = mission_from_env();
    let mission = load_mission(&app_paths, &mission_id)?;
    let collaborators = Collaborators {
        ui: Box::new(ConsoleUi::default()),
        scene_graph: Box::new(LoggedSceneGraph::default()),
        leaderboard: Box::new(JsonFileLeaderboard::in_dir(&app_paths.saves_dir)),
    };
    let session = GameSession::new(mission, SessionConfig::default(), collaborators);
    let config = LoopConfig {
        realtime: realtime_from_env(),
        ..LoopConfig::default()
    };

    Ok(AppWiring {
        config,
        session,
        driver: Autopilot::default(),
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

fn mission_from_env() -> String {
    parse_mission_id(env::var(MISSION_ENV_VAR).ok().as_deref())
}

fn parse_mission_id(raw: Option<&str>) -> String {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_MISSION)
        .to_string()
}

fn realtime_from_env() -> bool {
    match env::var(REALTIME_ENV_VAR) {
        Ok(value) => parse_flag(&value).unwrap_or_else(|| {
            warn!(
                env_var = REALTIME_ENV_VAR,
                value = value.as_str(),
                "invalid realtime flag; running unpaced"
            );
            false
        }),
        Err(_) => false,
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
