use std::collections::HashSet;

use glam::Vec3;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::camera::{CameraPose, CameraRig, CameraWriteError, CameraWriter};
use super::spline::{cubic_ease_in_out, CatmullRomCurve, CurveError};
use crate::content::PathDefinition;

/// Look-ahead offset in eased-progress space when a path has no fixed target.
pub const LOOK_AHEAD_OFFSET: f32 = 0.1;
pub const LOOK_AHEAD_DISTANCE: f32 = 10.0;
pub const MIN_LOOK_VERTICAL_OFFSET: f32 = 0.5;

#[derive(Debug, Error)]
pub enum TraversalStartError {
    #[error("path index {path_index} is out of range ({path_count} paths loaded)")]
    UnknownPath { path_index: usize, path_count: usize },
    #[error("path '{path_id}' yields {points} curve point(s); at least 2 are required")]
    TooFewPoints { path_id: String, points: usize },
    #[error("path {active} is still active; stop it before starting path {requested}")]
    PathConflict { active: usize, requested: usize },
    #[error("camera is unavailable for traversal: {0}")]
    Camera(#[from] CameraWriteError),
    #[error("failed to build curve for path '{path_id}': {source}")]
    Curve {
        path_id: String,
        #[source]
        source: CurveError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TraversalTick {
    Idle,
    Moving { progress: f32, eased: f32 },
    Completed { path_index: usize },
}

#[derive(Debug, Clone)]
pub struct TraversalState {
    pub path_index: usize,
    pub curve: CatmullRomCurve,
    pub start_time: f64,
    pub progress: f32,
    pub eased_progress: f32,
    fired_triggers: HashSet<usize>,
}

impl TraversalState {
    pub fn mark_fired(&mut self, trigger_index: usize) -> bool {
        self.fired_triggers.insert(trigger_index)
    }

    pub fn fired_count(&self) -> usize {
        self.fired_triggers.len()
    }
}

#[derive(Debug, Default)]
pub struct PathTraversalController {
    paths: Vec<PathDefinition>,
    active: Option<TraversalState>,
    // A traversal that completed this tick, kept until the next tick so the
    // spawn scheduler still sees the triggers crossed by the final step.
    retired: Option<TraversalState>,
    next_path_index: usize,
}

impl PathTraversalController {
    pub fn new(paths: Vec<PathDefinition>) -> Self {
        Self {
            paths,
            active: None,
            retired: None,
            next_path_index: 0,
        }
    }

    pub fn paths(&self) -> &[PathDefinition] {
        &self.paths
    }

    pub fn is_moving(&self) -> bool {
        self.active.is_some()
    }

    pub fn current_path_index(&self) -> Option<usize> {
        self.active.as_ref().map(|state| state.path_index)
    }

    pub fn current_path(&self) -> Option<&PathDefinition> {
        self.current_path_index()
            .and_then(|index| self.paths.get(index))
    }

    pub fn next_path_index(&self) -> usize {
        self.next_path_index
    }

    pub fn progress(&self) -> f32 {
        self.active.as_ref().map_or(0.0, |state| state.progress)
    }

    pub fn eased_progress(&self) -> f32 {
        self.active.as_ref().map_or(0.0, |state| state.eased_progress)
    }

    pub fn state(&self) -> Option<&TraversalState> {
        self.active.as_ref()
    }

    pub fn trigger_window_mut(&mut self) -> Option<(&PathDefinition, &mut TraversalState)> {
        let state = match (self.active.as_mut(), self.retired.as_mut()) {
            (Some(active), _) => active,
            (None, Some(retired)) => retired,
            (None, None) => return None,
        };
        let path = self.paths.get(state.path_index)?;
        Some((path, state))
    }

    pub fn start(
        &mut self,
        path_index: usize,
        current_position: Vec3,
        now: f64,
        camera: &mut CameraRig,
    ) -> Result<(), TraversalStartError> {
        let path = self
            .paths
            .get(path_index)
            .ok_or(TraversalStartError::UnknownPath {
                path_index,
                path_count: self.paths.len(),
            })?;
        if let Some(active) = &self.active {
            if active.path_index != path_index {
                return Err(TraversalStartError::PathConflict {
                    active: active.path_index,
                    requested: path_index,
                });
            }
        }

        let mut points = Vec::with_capacity(path.waypoints.len() + 1);
        points.push(current_position);
        points.extend_from_slice(&path.waypoints);
        if points.len() < 2 {
            return Err(TraversalStartError::TooFewPoints {
                path_id: path.id.clone(),
                points: points.len(),
            });
        }
        let curve = CatmullRomCurve::new(points).map_err(|source| TraversalStartError::Curve {
            path_id: path.id.clone(),
            source,
        })?;
        camera.claim(CameraWriter::Traversal)?;
        camera.set_free_look_enabled(false);

        info!(
            path_id = %path.id,
            path_index,
            duration_seconds = path.duration_seconds,
            superseded = self.active.is_some(),
            "traversal_started"
        );
        self.retired = None;
        self.active = Some(TraversalState {
            path_index,
            curve,
            start_time: now,
            progress: 0.0,
            eased_progress: 0.0,
            fired_triggers: HashSet::new(),
        });
        Ok(())
    }

    pub fn tick(&mut self, now: f64, camera: &mut CameraRig) -> TraversalTick {
        self.retired = None;
        let Some(state) = self.active.as_mut() else {
            return TraversalTick::Idle;
        };
        let Some(path) = self.paths.get(state.path_index) else {
            warn!(path_index = state.path_index, "traversal_path_missing");
            self.active = None;
            camera.release(CameraWriter::Traversal);
            return TraversalTick::Idle;
        };

        let progress = progress_at(path, state.start_time, now).max(state.progress);
        state.progress = progress;

        if progress >= 1.0 {
            state.eased_progress = 1.0;
            let pose = final_pose(path, &state.curve);
            write_pose(camera, pose);
            let path_index = state.path_index;
            self.retired = self.active.take();
            self.next_path_index = path_index + 1;
            camera.release(CameraWriter::Traversal);
            camera.set_free_look_enabled(true);
            info!(path_index, "traversal_completed");
            return TraversalTick::Completed { path_index };
        }

        let eased = cubic_ease_in_out(progress);
        state.eased_progress = eased;
        write_pose(camera, sample_pose(path, &state.curve, eased));
        TraversalTick::Moving { progress, eased }
    }

    /// Reapplies the pose for `now` without touching progress or triggers,
    /// then seals the camera for the rest of the tick.
    pub fn force_resync(&self, now: f64, camera: &mut CameraRig) {
        let Some(state) = self.active.as_ref() else {
            return;
        };
        let Some(path) = self.paths.get(state.path_index) else {
            return;
        };
        let progress = progress_at(path, state.start_time, now).max(state.progress);
        let pose = if progress >= 1.0 {
            final_pose(path, &state.curve)
        } else {
            sample_pose(path, &state.curve, cubic_ease_in_out(progress))
        };
        write_pose(camera, pose);
        camera.seal();
    }

    pub fn stop(&mut self, camera: &mut CameraRig) {
        if let Some(state) = self.active.take() {
            debug!(path_index = state.path_index, progress = state.progress, "traversal_stopped");
            camera.release(CameraWriter::Traversal);
            camera.set_free_look_enabled(true);
        }
        self.retired = None;
    }
}

fn progress_at(path: &PathDefinition, start_time: f64, now: f64) -> f32 {
    if path.duration_seconds <= 0.0 {
        return 1.0;
    }
    let elapsed = (now - start_time).max(0.0);
    (elapsed / f64::from(path.duration_seconds)).min(1.0) as f32
}

fn sample_pose(path: &PathDefinition, curve: &CatmullRomCurve, eased: f32) -> CameraPose {
    let position = curve.point_at(eased);
    let target = path
        .look_at
        .unwrap_or_else(|| curve.point_at((eased + LOOK_AHEAD_OFFSET).min(1.0)));
    look_pose(position, target, curve.tangent_at(eased))
}

fn final_pose(path: &PathDefinition, curve: &CatmullRomCurve) -> CameraPose {
    let position = curve.last_point();
    let target = path.look_at.unwrap_or(position);
    look_pose(position, target, curve.tangent_at(1.0))
}

fn look_pose(position: Vec3, target: Vec3, fallback_direction: Vec3) -> CameraPose {
    let mut direction = (target - position).normalize_or_zero();
    if direction == Vec3::ZERO {
        direction = fallback_direction;
    }
    if direction == Vec3::ZERO {
        direction = Vec3::NEG_Z;
    }
    let mut look_at = position + direction * LOOK_AHEAD_DISTANCE;
    look_at.y = look_at.y.max(position.y + MIN_LOOK_VERTICAL_OFFSET);
    CameraPose { position, look_at }
}

fn write_pose(camera: &mut CameraRig, pose: CameraPose) {
    if let Err(err) = camera.write(CameraWriter::Traversal, pose) {
        warn!(error = %err, "traversal_camera_write_rejected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::SpawnTrigger;
    use crate::app::enemy::EnemyKind;

    fn assert_vec3_close(actual: Vec3, expected: Vec3, epsilon: f32) {
        assert!(
            actual.distance(expected) <= epsilon,
            "{actual:?} vs {expected:?}"
        );
    }

    fn straight_path(id: &str, end_z: f32, duration_seconds: f32) -> PathDefinition {
        PathDefinition {
            id: id.to_string(),
            waypoints: vec![
                Vec3::new(0.0, 1.6, end_z / 2.0),
                Vec3::new(0.0, 1.6, end_z),
            ],
            duration_seconds,
            look_at: None,
            spawn_triggers: vec![SpawnTrigger {
                progress: 0.5,
                kind: EnemyKind::Walker,
                position: Vec3::new(0.0, 0.0, end_z - 5.0),
                sub_path: Vec::new(),
            }],
        }
    }

    fn controller() -> PathTraversalController {
        PathTraversalController::new(vec![
            straight_path("alley", -20.0, 4.0),
            straight_path("plaza", -40.0, 2.0),
        ])
    }

    const START: Vec3 = Vec3::new(0.0, 1.6, 0.0);

    #[test]
    fn start_rejects_unknown_path_without_mutation() {
        let mut traversal = controller();
        let mut camera = CameraRig::default();
        let err = traversal
            .start(9, START, 0.0, &mut camera)
            .expect_err("unknown path");
        assert!(matches!(err, TraversalStartError::UnknownPath { path_index: 9, .. }));
        assert!(!traversal.is_moving());
        assert_eq!(camera.owner(), None);
        assert!(camera.free_look_enabled());
    }

    #[test]
    fn start_rejects_non_finite_curve_points() {
        let mut traversal = controller();
        let mut camera = CameraRig::default();
        let err = traversal
            .start(0, Vec3::new(f32::NAN, 0.0, 0.0), 0.0, &mut camera)
            .expect_err("nan start");
        assert!(matches!(err, TraversalStartError::Curve { .. }));
        assert!(!traversal.is_moving());
    }

    #[test]
    fn start_rejects_path_without_waypoints() {
        let mut traversal = PathTraversalController::new(vec![PathDefinition {
            id: "empty".to_string(),
            waypoints: Vec::new(),
            duration_seconds: 1.0,
            look_at: None,
            spawn_triggers: Vec::new(),
        }]);
        let mut camera = CameraRig::default();
        let err = traversal
            .start(0, START, 0.0, &mut camera)
            .expect_err("too few points");
        assert!(matches!(err, TraversalStartError::TooFewPoints { points: 1, .. }));
    }

    #[test]
    fn start_rejects_other_path_while_active() {
        let mut traversal = controller();
        let mut camera = CameraRig::default();
        traversal.start(0, START, 0.0, &mut camera).expect("start");
        let err = traversal
            .start(1, START, 0.5, &mut camera)
            .expect_err("conflict");
        assert!(matches!(
            err,
            TraversalStartError::PathConflict {
                active: 0,
                requested: 1
            }
        ));
        assert_eq!(traversal.current_path_index(), Some(0));

        traversal.stop(&mut camera);
        traversal.start(1, START, 0.5, &mut camera).expect("after stop");
        assert_eq!(traversal.current_path().map(|p| p.id.as_str()), Some("plaza"));
    }

    #[test]
    fn restarting_same_path_supersedes_and_clears_dedup() {
        let mut traversal = controller();
        let mut camera = CameraRig::default();
        traversal.start(0, START, 0.0, &mut camera).expect("start");
        traversal.tick(3.0, &mut camera);
        let (_, state) = traversal.trigger_window_mut().expect("active");
        assert!(state.mark_fired(0));

        traversal.start(0, START, 3.0, &mut camera).expect("supersede");
        assert_eq!(traversal.progress(), 0.0);
        assert_eq!(traversal.state().expect("state").fired_count(), 0);
    }

    #[test]
    fn start_fails_when_camera_owned_elsewhere() {
        let mut traversal = controller();
        let mut camera = CameraRig::default();
        camera.claim(CameraWriter::SceneTransition).expect("claim");
        let err = traversal
            .start(0, START, 0.0, &mut camera)
            .expect_err("camera busy");
        assert!(matches!(err, TraversalStartError::Camera(_)));
        assert!(!traversal.is_moving());
    }

    #[test]
    fn start_claims_camera_and_disables_free_look() {
        let mut traversal = controller();
        let mut camera = CameraRig::default();
        traversal.start(0, START, 0.0, &mut camera).expect("start");
        assert_eq!(camera.owner(), Some(CameraWriter::Traversal));
        assert!(!camera.free_look_enabled());
        assert!(camera
            .write(CameraWriter::FreeLook, CameraPose::default())
            .is_err());
    }

    #[test]
    fn endpoints_are_exact_for_any_tick_granularity() {
        for step in [0.016_f64, 0.1, 0.7, 3.9, 10.0] {
            let mut traversal = controller();
            let mut camera = CameraRig::default();
            traversal.start(0, START, 0.0, &mut camera).expect("start");
            traversal.tick(0.0, &mut camera);
            assert_vec3_close(camera.position(), START, 1e-5);

            let mut now = 0.0;
            loop {
                now += step;
                if let TraversalTick::Completed { path_index } = traversal.tick(now, &mut camera) {
                    assert_eq!(path_index, 0);
                    break;
                }
            }
            assert_eq!(camera.position(), Vec3::new(0.0, 1.6, -20.0));
            assert!(!traversal.is_moving());
            assert_eq!(traversal.next_path_index(), 1);
            assert_eq!(camera.owner(), None);
            assert!(camera.free_look_enabled());
        }
    }

    #[test]
    fn progress_never_decreases() {
        let mut traversal = controller();
        let mut camera = CameraRig::default();
        traversal.start(0, START, 10.0, &mut camera).expect("start");
        traversal.tick(12.0, &mut camera);
        assert!((traversal.progress() - 0.5).abs() < 1e-6);
        traversal.tick(11.0, &mut camera);
        assert!((traversal.progress() - 0.5).abs() < 1e-6);
        traversal.tick(9.0, &mut camera);
        assert!((traversal.progress() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn eased_progress_follows_cubic_curve() {
        let mut traversal = controller();
        let mut camera = CameraRig::default();
        traversal.start(0, START, 0.0, &mut camera).expect("start");
        match traversal.tick(1.0, &mut camera) {
            TraversalTick::Moving { progress, eased } => {
                assert!((progress - 0.25).abs() < 1e-6);
                assert!((eased - 0.0625).abs() < 1e-6);
            }
            other => panic!("unexpected tick result {other:?}"),
        }
    }

    #[test]
    fn look_point_stays_above_camera() {
        let mut traversal = PathTraversalController::new(vec![PathDefinition {
            id: "descent".to_string(),
            waypoints: vec![Vec3::new(0.0, 0.5, -10.0), Vec3::new(0.0, 0.0, -20.0)],
            duration_seconds: 2.0,
            look_at: None,
            spawn_triggers: Vec::new(),
        }]);
        let mut camera = CameraRig::default();
        traversal
            .start(0, Vec3::new(0.0, 3.0, 0.0), 0.0, &mut camera)
            .expect("start");
        traversal.tick(1.0, &mut camera);
        let pose = camera.pose();
        assert!(pose.look_at.y >= pose.position.y + MIN_LOOK_VERTICAL_OFFSET - 1e-5);
    }

    #[test]
    fn fixed_look_at_steers_orientation() {
        let target = Vec3::new(10.0, 1.6, -10.0);
        let mut path = straight_path("overlook", -20.0, 2.0);
        path.look_at = Some(target);
        let mut traversal = PathTraversalController::new(vec![path]);
        let mut camera = CameraRig::default();
        traversal.start(0, START, 0.0, &mut camera).expect("start");
        traversal.tick(0.5, &mut camera);
        let pose = camera.pose();
        let to_target = (target - pose.position).normalize();
        let horizontal = |v: Vec3| Vec3::new(v.x, 0.0, v.z).normalize();
        assert!(horizontal(pose.forward()).dot(horizontal(to_target)) > 0.999);
    }

    #[test]
    fn force_resync_reapplies_pose_and_seals_camera() {
        let mut traversal = controller();
        let mut camera = CameraRig::default();
        traversal.start(0, START, 0.0, &mut camera).expect("start");
        traversal.tick(1.0, &mut camera);
        let expected = camera.pose();

        camera.release(CameraWriter::Traversal);
        camera
            .write(CameraWriter::SceneTransition, CameraPose::default())
            .expect("rogue write while unowned");
        camera.claim(CameraWriter::Traversal).expect("reclaim");

        traversal.force_resync(1.0, &mut camera);
        assert_eq!(camera.pose(), expected);
        assert!(camera.is_sealed());
        assert!(camera
            .write(CameraWriter::Traversal, CameraPose::default())
            .is_err());

        let progress = traversal.progress();
        traversal.force_resync(1.0, &mut camera);
        assert_eq!(traversal.progress(), progress);
    }

    #[test]
    fn completed_traversal_stays_in_trigger_window_for_one_tick() {
        let mut traversal = controller();
        let mut camera = CameraRig::default();
        traversal.start(1, START, 0.0, &mut camera).expect("start");
        assert_eq!(
            traversal.tick(5.0, &mut camera),
            TraversalTick::Completed { path_index: 1 }
        );
        let (path, state) = traversal.trigger_window_mut().expect("retired");
        assert_eq!(path.id, "plaza");
        assert_eq!(state.progress, 1.0);

        assert_eq!(traversal.tick(5.1, &mut camera), TraversalTick::Idle);
        assert!(traversal.trigger_window_mut().is_none());
    }
}
