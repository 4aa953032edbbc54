use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::camera::{CameraPose, CameraRig, CameraWriteError, CameraWriter};
use super::enemy::EnemyRoster;
use super::spline::quadratic_ease_in_out;

pub const SCENE_TRANSITION_SECONDS: f64 = 2.0;
pub const MISSION_COMPLETE_DELAY_SECONDS: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Loading,
    Gameplay,
    SceneTransition,
    MissionComplete,
    GameOver,
}

impl LifecycleState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Gameplay => "gameplay",
            Self::SceneTransition => "scene_transition",
            Self::MissionComplete => "mission_complete",
            Self::GameOver => "game_over",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::MissionComplete | Self::GameOver)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    SceneEntered { scene_index: usize },
    SceneCleared { scene_index: usize },
    DoorInteractionRequested { scene_index: usize },
    SceneTransitionStarted { from_scene: usize, to_scene: usize },
    MissionCompletePending,
    MissionComplete,
    GameOver,
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("lifecycle is {actual:?}; expected {expected:?}")]
    WrongState {
        expected: LifecycleState,
        actual: LifecycleState,
    },
    #[error("no door interaction is pending")]
    NoDoorPending,
    #[error("scene {scene_index} has no successor")]
    NoNextScene { scene_index: usize },
    #[error("scene transition cannot take the camera: {0}")]
    Camera(#[from] CameraWriteError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SceneTransition {
    from: CameraPose,
    to: CameraPose,
    started_at: f64,
    target_scene: usize,
}

#[derive(Debug, Clone)]
pub struct SceneLifecycleCoordinator {
    state: LifecycleState,
    scene_index: usize,
    scene_poses: Vec<CameraPose>,
    transition: Option<SceneTransition>,
    door_pending: bool,
    mission_complete_at: Option<f64>,
}

impl SceneLifecycleCoordinator {
    pub fn new(scene_poses: Vec<CameraPose>) -> Self {
        Self {
            state: LifecycleState::Loading,
            scene_index: 0,
            scene_poses,
            transition: None,
            door_pending: false,
            mission_complete_at: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn scene_index(&self) -> usize {
        self.scene_index
    }

    pub fn total_scenes(&self) -> usize {
        self.scene_poses.len()
    }

    pub fn is_final_scene(&self) -> bool {
        self.scene_index + 1 >= self.scene_poses.len()
    }

    pub fn door_pending(&self) -> bool {
        self.door_pending
    }

    pub fn gameplay_systems_active(&self) -> bool {
        self.state == LifecycleState::Gameplay
    }

    pub fn begin(&mut self) -> Result<LifecycleEvent, LifecycleError> {
        if self.state != LifecycleState::Loading {
            return Err(LifecycleError::WrongState {
                expected: LifecycleState::Loading,
                actual: self.state,
            });
        }
        self.state = LifecycleState::Gameplay;
        self.scene_index = 0;
        info!(scene_index = 0, total_scenes = self.total_scenes(), "mission_started");
        Ok(LifecycleEvent::SceneEntered { scene_index: 0 })
    }

    pub fn advance(&mut self, now: f64, camera: &mut CameraRig) -> Vec<LifecycleEvent> {
        let mut events = Vec::new();
        if let Some(transition) = self.transition {
            let t = ((now - transition.started_at) / SCENE_TRANSITION_SECONDS).clamp(0.0, 1.0) as f32;
            let pose = if t >= 1.0 {
                transition.to
            } else {
                let eased = quadratic_ease_in_out(t);
                CameraPose {
                    position: transition.from.position.lerp(transition.to.position, eased),
                    look_at: transition.from.look_at.lerp(transition.to.look_at, eased),
                }
            };
            if let Err(err) = camera.write(CameraWriter::SceneTransition, pose) {
                warn!(error = %err, "scene_transition_camera_write_rejected");
            }
            if t >= 1.0 {
                self.transition = None;
                camera.release(CameraWriter::SceneTransition);
                self.scene_index = transition.target_scene;
                self.state = LifecycleState::Gameplay;
                info!(scene_index = self.scene_index, "scene_entered");
                events.push(LifecycleEvent::SceneEntered {
                    scene_index: self.scene_index,
                });
            }
        }

        if let Some(due_at) = self.mission_complete_at {
            if self.state == LifecycleState::Gameplay && now >= due_at {
                self.mission_complete_at = None;
                self.state = LifecycleState::MissionComplete;
                info!(scene_index = self.scene_index, "mission_complete");
                events.push(LifecycleEvent::MissionComplete);
            }
        }
        events
    }

    pub fn check_roster(
        &mut self,
        roster: &EnemyRoster,
        now: f64,
        camera: &mut CameraRig,
    ) -> Vec<LifecycleEvent> {
        if self.state != LifecycleState::Gameplay
            || self.door_pending
            || self.mission_complete_at.is_some()
            || !roster.is_cleared()
        {
            return Vec::new();
        }

        let scene_index = self.scene_index;
        info!(scene_index, "scene_cleared");
        let mut events = vec![LifecycleEvent::SceneCleared { scene_index }];

        if self.is_final_scene() {
            self.mission_complete_at = Some(now + MISSION_COMPLETE_DELAY_SECONDS);
            events.push(LifecycleEvent::MissionCompletePending);
        } else if scene_index == 0 {
            self.door_pending = true;
            info!(scene_index, "door_interaction_requested");
            events.push(LifecycleEvent::DoorInteractionRequested { scene_index });
        } else {
            match self.begin_transition(now, camera) {
                Ok(event) => events.push(event),
                Err(err) => warn!(error = %err, scene_index, "scene_transition_start_failed"),
            }
        }
        events
    }

    pub fn resolve_door_interaction(
        &mut self,
        now: f64,
        camera: &mut CameraRig,
    ) -> Result<LifecycleEvent, LifecycleError> {
        if !self.door_pending {
            return Err(LifecycleError::NoDoorPending);
        }
        let event = self.begin_transition(now, camera)?;
        self.door_pending = false;
        Ok(event)
    }

    pub fn signal_player_dead(&mut self, camera: &mut CameraRig) -> Option<LifecycleEvent> {
        if !matches!(
            self.state,
            LifecycleState::Gameplay | LifecycleState::SceneTransition
        ) {
            return None;
        }
        if self.transition.take().is_some() {
            camera.release(CameraWriter::SceneTransition);
        }
        self.door_pending = false;
        self.mission_complete_at = None;
        self.state = LifecycleState::GameOver;
        info!(scene_index = self.scene_index, "game_over");
        Some(LifecycleEvent::GameOver)
    }

    fn begin_transition(
        &mut self,
        now: f64,
        camera: &mut CameraRig,
    ) -> Result<LifecycleEvent, LifecycleError> {
        if self.state != LifecycleState::Gameplay {
            return Err(LifecycleError::WrongState {
                expected: LifecycleState::Gameplay,
                actual: self.state,
            });
        }
        let target_scene = self.scene_index + 1;
        let to = *self
            .scene_poses
            .get(target_scene)
            .ok_or(LifecycleError::NoNextScene {
                scene_index: self.scene_index,
            })?;
        camera.claim(CameraWriter::SceneTransition)?;
        self.transition = Some(SceneTransition {
            from: camera.pose(),
            to,
            started_at: now,
            target_scene,
        });
        self.state = LifecycleState::SceneTransition;
        info!(
            from_scene = self.scene_index,
            to_scene = target_scene,
            "scene_transition_started"
        );
        Ok(LifecycleEvent::SceneTransitionStarted {
            from_scene: self.scene_index,
            to_scene: target_scene,
        })
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::app::collaborators::RenderableId;
    use crate::app::enemy::EnemyKind;
    use crate::app::tasks::DeferredTaskQueue;

    fn scene_pose(z: f32) -> CameraPose {
        CameraPose {
            position: Vec3::new(0.0, 1.6, z),
            look_at: Vec3::new(0.0, 1.6, z - 10.0),
        }
    }

    fn coordinator(scenes: usize) -> SceneLifecycleCoordinator {
        let poses = (0..scenes).map(|i| scene_pose(i as f32 * -50.0)).collect();
        let mut coordinator = SceneLifecycleCoordinator::new(poses);
        coordinator.begin().expect("begin");
        coordinator
    }

    fn cleared_roster() -> EnemyRoster {
        let mut tasks = DeferredTaskQueue::default();
        let mut roster = EnemyRoster::default();
        let id = roster.spawn(
            EnemyKind::Walker,
            EnemyKind::Walker.default_stats(),
            Vec3::new(0.0, 0.0, -10.0),
            Vec::new(),
            RenderableId(1),
        );
        roster
            .find_mut(id)
            .expect("walker")
            .apply_damage(1000, 0.0, &mut tasks);
        for task in tasks.drain_due(5.0) {
            roster.apply_task(&task);
        }
        roster
    }

    #[test]
    fn begin_moves_loading_to_gameplay_once() {
        let mut coordinator = SceneLifecycleCoordinator::new(vec![scene_pose(0.0)]);
        assert_eq!(coordinator.state(), LifecycleState::Loading);
        assert!(!coordinator.gameplay_systems_active());
        assert_eq!(
            coordinator.begin().expect("begin"),
            LifecycleEvent::SceneEntered { scene_index: 0 }
        );
        assert!(coordinator.gameplay_systems_active());
        assert!(coordinator.begin().is_err());
    }

    #[test]
    fn uncleared_roster_raises_nothing() {
        let mut coordinator = coordinator(3);
        let mut camera = CameraRig::default();
        assert!(coordinator
            .check_roster(&EnemyRoster::default(), 0.0, &mut camera)
            .is_empty());

        let mut roster = EnemyRoster::default();
        roster.spawn(
            EnemyKind::Runner,
            EnemyKind::Runner.default_stats(),
            Vec3::ZERO,
            Vec::new(),
            RenderableId(2),
        );
        assert!(coordinator.check_roster(&roster, 0.0, &mut camera).is_empty());
    }

    #[test]
    fn first_scene_clear_requests_door_interaction() {
        let mut coordinator = coordinator(3);
        let mut camera = CameraRig::default();
        let events = coordinator.check_roster(&cleared_roster(), 1.0, &mut camera);
        assert_eq!(
            events,
            vec![
                LifecycleEvent::SceneCleared { scene_index: 0 },
                LifecycleEvent::DoorInteractionRequested { scene_index: 0 },
            ]
        );
        assert_eq!(coordinator.state(), LifecycleState::Gameplay);
        assert!(coordinator
            .check_roster(&cleared_roster(), 1.1, &mut camera)
            .is_empty());

        let event = coordinator
            .resolve_door_interaction(2.0, &mut camera)
            .expect("door");
        assert_eq!(
            event,
            LifecycleEvent::SceneTransitionStarted {
                from_scene: 0,
                to_scene: 1
            }
        );
        assert_eq!(coordinator.state(), LifecycleState::SceneTransition);
        assert!(coordinator.resolve_door_interaction(2.0, &mut camera).is_err());
    }

    #[test]
    fn transition_eases_camera_and_enters_next_scene() {
        let mut coordinator = coordinator(3);
        let mut camera = CameraRig::default();
        coordinator.check_roster(&cleared_roster(), 0.0, &mut camera);
        coordinator
            .resolve_door_interaction(0.0, &mut camera)
            .expect("door");
        let from = camera.position();
        assert_eq!(camera.owner(), Some(CameraWriter::SceneTransition));

        assert!(coordinator.advance(1.0, &mut camera).is_empty());
        let midpoint = from.lerp(scene_pose(-50.0).position, 0.5);
        assert!(camera.position().distance(midpoint) < 1e-4);
        assert!(!coordinator.gameplay_systems_active());

        let events = coordinator.advance(2.0, &mut camera);
        assert_eq!(events, vec![LifecycleEvent::SceneEntered { scene_index: 1 }]);
        assert_eq!(camera.pose(), scene_pose(-50.0));
        assert_eq!(camera.owner(), None);
        assert_eq!(coordinator.scene_index(), 1);
        assert!(coordinator.gameplay_systems_active());
    }

    #[test]
    fn middle_scene_clear_transitions_directly() {
        let mut coordinator = coordinator(3);
        let mut camera = CameraRig::default();
        coordinator.check_roster(&cleared_roster(), 0.0, &mut camera);
        coordinator
            .resolve_door_interaction(0.0, &mut camera)
            .expect("door");
        coordinator.advance(2.0, &mut camera);

        let events = coordinator.check_roster(&cleared_roster(), 3.0, &mut camera);
        assert_eq!(
            events,
            vec![
                LifecycleEvent::SceneCleared { scene_index: 1 },
                LifecycleEvent::SceneTransitionStarted {
                    from_scene: 1,
                    to_scene: 2
                },
            ]
        );
    }

    #[test]
    fn transition_waits_while_traversal_owns_camera() {
        let mut coordinator = coordinator(3);
        let mut camera = CameraRig::default();
        coordinator.check_roster(&cleared_roster(), 0.0, &mut camera);
        camera.claim(CameraWriter::Traversal).expect("claim");
        let err = coordinator
            .resolve_door_interaction(0.0, &mut camera)
            .expect_err("camera busy");
        assert!(matches!(err, LifecycleError::Camera(_)));
        assert!(coordinator.door_pending());
        assert_eq!(coordinator.state(), LifecycleState::Gameplay);
    }

    #[test]
    fn final_scene_clear_completes_mission_after_delay() {
        let mut coordinator = coordinator(1);
        let mut camera = CameraRig::default();
        let events = coordinator.check_roster(&cleared_roster(), 10.0, &mut camera);
        assert_eq!(events.last(), Some(&LifecycleEvent::MissionCompletePending));
        assert!(coordinator.advance(11.9, &mut camera).is_empty());
        assert_eq!(coordinator.state(), LifecycleState::Gameplay);

        assert_eq!(
            coordinator.advance(12.0, &mut camera),
            vec![LifecycleEvent::MissionComplete]
        );
        assert!(!coordinator.gameplay_systems_active());
        assert!(coordinator.state().is_terminal());
    }

    #[test]
    fn player_death_ends_run_from_gameplay_or_transition() {
        let mut coordinator = coordinator(3);
        let mut camera = CameraRig::default();
        coordinator.check_roster(&cleared_roster(), 0.0, &mut camera);
        coordinator
            .resolve_door_interaction(0.0, &mut camera)
            .expect("door");
        assert_eq!(
            coordinator.signal_player_dead(&mut camera),
            Some(LifecycleEvent::GameOver)
        );
        assert_eq!(coordinator.state(), LifecycleState::GameOver);
        assert_eq!(camera.owner(), None);
        assert_eq!(coordinator.signal_player_dead(&mut camera), None);
        assert!(coordinator.advance(10.0, &mut camera).is_empty());
    }
}
