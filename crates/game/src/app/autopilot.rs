use glam::Vec3;
use rail_engine::{EnemyKind, GameSession, InputDriver, LifecycleState, Ray};
use tracing::{debug, warn};

const DEFAULT_FIRE_INTERVAL_SECONDS: f64 = 0.2;
const DEFAULT_MODEL_LOAD_SECONDS: f64 = 0.5;
/// Aim point above the hit-volume centre, as a fraction of body height.
const HEAD_AIM_FRACTION: f32 = 0.35;

/// Plays a mission unattended: shoots the nearest target on a fixed cadence,
/// reloads on an empty magazine and walks through doors as they open.
#[derive(Debug, Clone)]
pub(crate) struct Autopilot {
    fire_interval: f64,
    next_shot_at: f64,
    /// Every Nth shot aims for the head; 0 never does.
    headshot_every: u32,
    shots_queued: u32,
    models_ready_at: f64,
    models_announced: bool,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self {
            fire_interval: DEFAULT_FIRE_INTERVAL_SECONDS,
            next_shot_at: 0.0,
            headshot_every: 2,
            shots_queued: 0,
            models_ready_at: DEFAULT_MODEL_LOAD_SECONDS,
            models_announced: false,
        }
    }
}

impl Autopilot {
    fn aim_point(&self, session: &GameSession, origin: Vec3) -> Option<Vec3> {
        let aim_for_head =
            self.headshot_every > 0 && (self.shots_queued + 1) % self.headshot_every == 0;
        let enemy = session
            .roster()
            .live()
            .map(|enemy| {
                let mut point = enemy.position;
                if aim_for_head {
                    point += Vec3::Y * enemy.stats.body_height * HEAD_AIM_FRACTION;
                }
                (point, origin.distance_squared(enemy.position))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1));
        let collectible = session
            .collectibles()
            .available()
            .map(|item| (item.position, origin.distance_squared(item.position)))
            .min_by(|a, b| a.1.total_cmp(&b.1));

        match (enemy, collectible) {
            (Some(enemy), Some(item)) if item.1 < enemy.1 => Some(item.0),
            (Some(enemy), _) => Some(enemy.0),
            (None, Some(item)) => Some(item.0),
            (None, None) => None,
        }
    }
}

impl InputDriver for Autopilot {
    fn drive(&mut self, session: &mut GameSession, now: f64) {
        if !self.models_announced && now >= self.models_ready_at {
            for kind in EnemyKind::ALL {
                session.notify_asset_loaded(kind);
            }
            self.models_announced = true;
        }

        if session.door_pending() {
            if let Err(error) = session.resolve_door_interaction(now) {
                warn!(error = %error, "autopilot_door_failed");
            }
            return;
        }
        if session.lifecycle_state() != LifecycleState::Gameplay {
            return;
        }

        let player = session.player();
        if player.is_reloading() {
            return;
        }
        if player.ammo() == 0 {
            debug!("autopilot_reload");
            session.queue_reload();
            return;
        }
        if now < self.next_shot_at {
            return;
        }

        let origin = session.camera_pose().position;
        let Some(target) = self.aim_point(session, origin) else {
            return;
        };
        session.queue_shot(Ray::toward(origin, target));
        self.shots_queued = self.shots_queued.saturating_add(1);
        self.next_shot_at = now + self.fire_interval;
    }
}
