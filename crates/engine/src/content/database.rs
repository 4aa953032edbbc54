use std::collections::HashMap;

use glam::Vec3;

use crate::app::{CameraPose, EnemyKind, EnemyStats, PowerUpKind};

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnTrigger {
    /// Traversal progress in [0, 1] at which the trigger fires.
    pub progress: f32,
    pub kind: EnemyKind,
    pub position: Vec3,
    pub sub_path: Vec<Vec3>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathDefinition {
    pub id: String,
    pub waypoints: Vec<Vec3>,
    pub duration_seconds: f32,
    pub look_at: Option<Vec3>,
    pub spawn_triggers: Vec<SpawnTrigger>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneSpawn {
    pub kind: EnemyKind,
    pub position: Vec3,
    pub sub_path: Vec<Vec3>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerUpPlacement {
    pub kind: PowerUpKind,
    pub position: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneDefinition {
    pub id: String,
    pub title: String,
    pub camera_position: Vec3,
    pub camera_look_at: Vec3,
    pub path_indices: Vec<usize>,
    pub spawns: Vec<SceneSpawn>,
    pub power_ups: Vec<PowerUpPlacement>,
}

impl SceneDefinition {
    pub fn camera_pose(&self) -> CameraPose {
        CameraPose {
            position: self.camera_position,
            look_at: self.camera_look_at,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MissionDatabase {
    mission_id: String,
    enemy_stats: HashMap<EnemyKind, EnemyStats>,
    paths: Vec<PathDefinition>,
    path_ids_by_name: HashMap<String, usize>,
    scenes: Vec<SceneDefinition>,
}

impl MissionDatabase {
    pub(crate) fn from_parts(
        mission_id: String,
        enemy_stats: HashMap<EnemyKind, EnemyStats>,
        paths: Vec<PathDefinition>,
        scenes: Vec<SceneDefinition>,
    ) -> Self {
        let path_ids_by_name = paths
            .iter()
            .enumerate()
            .map(|(index, path)| (path.id.clone(), index))
            .collect();
        Self {
            mission_id,
            enemy_stats,
            paths,
            path_ids_by_name,
            scenes,
        }
    }

    pub fn mission_id(&self) -> &str {
        &self.mission_id
    }

    pub fn enemy_stats(&self, kind: EnemyKind) -> EnemyStats {
        self.enemy_stats
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_stats())
    }

    pub fn paths(&self) -> &[PathDefinition] {
        &self.paths
    }

    pub fn path_index_by_id(&self, id: &str) -> Option<usize> {
        self.path_ids_by_name.get(id).copied()
    }

    pub fn scenes(&self) -> &[SceneDefinition] {
        &self.scenes
    }

    pub fn scene(&self, index: usize) -> Option<&SceneDefinition> {
        self.scenes.get(index)
    }

    pub fn scene_poses(&self) -> Vec<CameraPose> {
        self.scenes.iter().map(SceneDefinition::camera_pose).collect()
    }
}
