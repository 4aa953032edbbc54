use std::error::Error as StdError;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::enemy::EnemyKind;
use super::lifecycle::LifecycleState;
use super::power_ups::PowerUpKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderableId(pub u64);

#[derive(Debug, Default)]
pub struct RenderableIdAllocator {
    next: u64,
}

impl RenderableIdAllocator {
    pub fn allocate(&mut self) -> RenderableId {
        let id = RenderableId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderableKind {
    Placeholder,
    Model(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderableDesc {
    pub kind: RenderableKind,
    pub debug_name: &'static str,
    pub position: Vec3,
}

/// Renderer scene graph. Every call may be a no-op (e.g. assets still
/// loading); the core never depends on the outcome.
pub trait SceneGraph {
    fn add(&mut self, id: RenderableId, desc: &RenderableDesc);
    fn remove(&mut self, id: RenderableId);
    fn swap_visual(&mut self, _id: RenderableId, _kind: &RenderableKind) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullSceneGraph;

impl SceneGraph for NullSceneGraph {
    fn add(&mut self, _id: RenderableId, _desc: &RenderableDesc) {}

    fn remove(&mut self, _id: RenderableId) {}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HudSnapshot {
    pub health: u32,
    pub max_health: u32,
    pub ammo: u32,
    pub magazine_size: u32,
    pub reloading: bool,
    pub score: u64,
    pub combo_streak: u32,
    pub scene_index: usize,
    pub total_scenes: usize,
    pub enemies_remaining: u32,
    pub lifecycle: LifecycleState,
}

pub trait UiSink {
    fn update_hud(&mut self, hud: &HudSnapshot);
    fn show_headshot_indicator(&mut self);
    fn show_power_up_message(&mut self, kind: PowerUpKind);
    fn show_scene_title(&mut self, title: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullUi;

impl UiSink for NullUi {
    fn update_hud(&mut self, _hud: &HudSnapshot) {}

    fn show_headshot_indicator(&mut self) {}

    fn show_power_up_message(&mut self, _kind: PowerUpKind) {}

    fn show_scene_title(&mut self, _title: &str) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionOutcome {
    MissionComplete,
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardRecord {
    pub mission: String,
    pub outcome: MissionOutcome,
    pub score: u64,
    pub max_streak: u32,
    pub shots_fired: u32,
    pub hits: u32,
    pub headshot_kills: u32,
    pub scenes_cleared: usize,
    pub accuracy: f32,
}

pub trait LeaderboardStore {
    fn record(&mut self, record: &LeaderboardRecord) -> Result<(), Box<dyn StdError + Send + Sync>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullLeaderboard;

impl LeaderboardStore for NullLeaderboard {
    fn record(
        &mut self,
        _record: &LeaderboardRecord,
    ) -> Result<(), Box<dyn StdError + Send + Sync>> {
        Ok(())
    }
}

pub struct Collaborators {
    pub ui: Box<dyn UiSink>,
    pub scene_graph: Box<dyn SceneGraph>,
    pub leaderboard: Box<dyn LeaderboardStore>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            ui: Box::new(NullUi),
            scene_graph: Box::new(NullSceneGraph),
            leaderboard: Box::new(NullLeaderboard),
        }
    }
}

pub fn default_renderable_for_enemy(kind: EnemyKind) -> RenderableKind {
    RenderableKind::Model(format!("enemies/{}.glb", kind.as_token()))
}
