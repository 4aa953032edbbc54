use glam::Vec3;
use tracing::info;

use super::enemy::EnemyKind;
use super::traversal::PathTraversalController;

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    pub path_index: usize,
    pub trigger_index: usize,
    pub kind: EnemyKind,
    pub position: Vec3,
    pub sub_path: Vec<Vec3>,
}

pub type SpawnListener = Box<dyn FnMut(&SpawnRequest)>;

#[derive(Default)]
pub struct EncounterSpawnScheduler {
    listeners: Vec<SpawnListener>,
}

impl EncounterSpawnScheduler {
    pub fn on_enemy_spawn(&mut self, listener: SpawnListener) {
        self.listeners.push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Each trigger fires at most once per traversal instance, in
    /// declaration order.
    pub fn evaluate(&mut self, traversal: &mut PathTraversalController) -> Vec<SpawnRequest> {
        let Some((path, state)) = traversal.trigger_window_mut() else {
            return Vec::new();
        };

        let mut emitted = Vec::new();
        for (trigger_index, trigger) in path.spawn_triggers.iter().enumerate() {
            if state.progress < trigger.progress || !state.mark_fired(trigger_index) {
                continue;
            }
            info!(
                path_id = %path.id,
                trigger_index,
                kind = trigger.kind.as_token(),
                progress = state.progress,
                "spawn_trigger_fired"
            );
            emitted.push(SpawnRequest {
                path_index: state.path_index,
                trigger_index,
                kind: trigger.kind,
                position: trigger.position,
                sub_path: trigger.sub_path.clone(),
            });
        }

        for request in &emitted {
            for listener in &mut self.listeners {
                listener(request);
            }
        }
        emitted
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::app::camera::CameraRig;
    use crate::content::{PathDefinition, SpawnTrigger};

    fn trigger(progress: f32, kind: EnemyKind) -> SpawnTrigger {
        SpawnTrigger {
            progress,
            kind,
            position: Vec3::new(0.0, 0.0, -15.0),
            sub_path: Vec::new(),
        }
    }

    fn setup() -> (PathTraversalController, CameraRig) {
        let path = PathDefinition {
            id: "street".to_string(),
            waypoints: vec![Vec3::new(0.0, 1.6, -10.0), Vec3::new(0.0, 1.6, -20.0)],
            duration_seconds: 10.0,
            look_at: None,
            spawn_triggers: vec![
                trigger(0.0, EnemyKind::Walker),
                trigger(0.3, EnemyKind::Runner),
                trigger(0.3, EnemyKind::Crawler),
                trigger(0.9, EnemyKind::Tank),
            ],
        };
        let mut traversal = PathTraversalController::new(vec![path]);
        let mut camera = CameraRig::default();
        traversal
            .start(0, Vec3::new(0.0, 1.6, 0.0), 0.0, &mut camera)
            .expect("start");
        (traversal, camera)
    }

    fn run(ticks: &[f64]) -> Vec<usize> {
        let (mut traversal, mut camera) = setup();
        let mut scheduler = EncounterSpawnScheduler::default();
        let mut fired = Vec::new();
        for &now in ticks {
            traversal.tick(now, &mut camera);
            fired.extend(
                scheduler
                    .evaluate(&mut traversal)
                    .into_iter()
                    .map(|request| request.trigger_index),
            );
        }
        fired
    }

    #[test]
    fn triggers_fire_once_under_uniform_ticks() {
        let ticks = (0..=120).map(|step| step as f64 * 0.1).collect::<Vec<_>>();
        assert_eq!(run(&ticks), vec![0, 1, 2, 3]);
    }

    #[test]
    fn triggers_fire_once_under_irregular_ticks() {
        assert_eq!(run(&[0.0, 0.01, 2.99, 3.0, 3.0, 3.5, 8.99, 9.0, 9.0, 11.0]), vec![0, 1, 2, 3]);
    }

    #[test]
    fn single_jump_to_completion_fires_remaining_triggers_once() {
        assert_eq!(run(&[0.5, 50.0, 60.0]), vec![0, 1, 2, 3]);
        assert_eq!(run(&[50.0]), vec![0, 1, 2, 3]);
    }

    #[test]
    fn idle_traversal_emits_nothing() {
        let mut traversal = PathTraversalController::default();
        let mut scheduler = EncounterSpawnScheduler::default();
        assert!(scheduler.evaluate(&mut traversal).is_empty());
    }

    #[test]
    fn listeners_receive_every_request() {
        let (mut traversal, mut camera) = setup();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = EncounterSpawnScheduler::default();
        let sink = Rc::clone(&seen);
        scheduler.on_enemy_spawn(Box::new(move |request| {
            sink.borrow_mut().push(request.kind);
        }));
        assert_eq!(scheduler.listener_count(), 1);

        traversal.tick(3.0, &mut camera);
        scheduler.evaluate(&mut traversal);
        assert_eq!(
            *seen.borrow(),
            vec![EnemyKind::Walker, EnemyKind::Runner, EnemyKind::Crawler]
        );
    }

    #[test]
    fn new_traversal_start_resets_dedup() {
        let (mut traversal, mut camera) = setup();
        let mut scheduler = EncounterSpawnScheduler::default();
        traversal.tick(5.0, &mut camera);
        assert_eq!(scheduler.evaluate(&mut traversal).len(), 3);
        assert!(scheduler.evaluate(&mut traversal).is_empty());

        traversal
            .start(0, Vec3::new(0.0, 1.6, 0.0), 5.0, &mut camera)
            .expect("restart");
        traversal.tick(5.0, &mut camera);
        assert_eq!(scheduler.evaluate(&mut traversal).len(), 1);
    }
}
