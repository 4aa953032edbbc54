use std::f32::consts::PI;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::collaborators::RenderableId;
use super::tasks::{DeferredTask, DeferredTaskQueue, TaskKind, TaskOwner};

pub const ATTACK_RANGE: f32 = 1.5;
pub const ATTACK_LUNGE_SECONDS: f64 = 0.5;
pub const DEATH_ANIMATION_SECONDS: f64 = 1.0;
pub const HIT_FLASH_SECONDS: f64 = 0.12;
pub const SLOW_MOTION_FACTOR: f32 = 0.5;
const PROXIMITY_FAR: f32 = 10.0;
const PROXIMITY_NEAR: f32 = 2.0;
const PROXIMITY_MAX_MULTIPLIER: f32 = 2.0;
const LUNGE_DISTANCE: f32 = 0.4;
const CRAWL_SWAY_AMPLITUDE: f32 = 1.2;
const CRAWL_SWAY_FREQUENCY: f32 = 3.0;
const ROUTE_ARRIVAL_THRESHOLD: f32 = 0.2;
const DEATH_ROTATION_DEGREES: f32 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Walker,
    Runner,
    Tank,
    Crawler,
}

impl EnemyKind {
    pub const ALL: [Self; 4] = [Self::Walker, Self::Runner, Self::Tank, Self::Crawler];

    pub fn as_token(self) -> &'static str {
        match self {
            Self::Walker => "walker",
            Self::Runner => "runner",
            Self::Tank => "tank",
            Self::Crawler => "crawler",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_token() == token)
    }

    /// Fraction of body height above which a hit counts as a headshot.
    pub fn headshot_threshold(self) -> f32 {
        match self {
            Self::Crawler => 0.9,
            Self::Walker | Self::Runner | Self::Tank => 0.7,
        }
    }

    pub fn default_stats(self) -> EnemyStats {
        match self {
            Self::Walker => EnemyStats {
                max_health: 100,
                speed: 2.0,
                damage: 10,
                score_value: 100,
                body_height: 1.8,
                hit_radius: 0.4,
            },
            Self::Runner => EnemyStats {
                max_health: 50,
                speed: 4.0,
                damage: 5,
                score_value: 150,
                body_height: 1.7,
                hit_radius: 0.35,
            },
            Self::Tank => EnemyStats {
                max_health: 300,
                speed: 1.0,
                damage: 25,
                score_value: 300,
                body_height: 2.4,
                hit_radius: 0.7,
            },
            Self::Crawler => EnemyStats {
                max_health: 75,
                speed: 2.5,
                damage: 8,
                score_value: 120,
                body_height: 0.6,
                hit_radius: 0.5,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyStats {
    pub max_health: i32,
    pub speed: f32,
    pub damage: u32,
    pub score_value: u32,
    pub body_height: f32,
    pub hit_radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EnemyId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyState {
    Approaching,
    Attacking,
    Dying,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiContext {
    pub now: f64,
    pub dt: f32,
    pub player_position: Vec3,
    pub slow_motion: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemyAttack {
    pub enemy_id: EnemyId,
    pub damage: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageOutcome {
    pub killed: bool,
    pub remaining_health: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyVisual {
    pub lunge_offset: Vec3,
    pub rotation_degrees: f32,
    pub opacity: f32,
    pub hit_flash: bool,
}

impl Default for EnemyVisual {
    fn default() -> Self {
        Self {
            lunge_offset: Vec3::ZERO,
            rotation_degrees: 0.0,
            opacity: 1.0,
            hit_flash: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnemyEntity {
    pub id: EnemyId,
    pub kind: EnemyKind,
    pub stats: EnemyStats,
    pub health: i32,
    pub max_health: i32,
    pub position: Vec3,
    pub current_speed: f32,
    pub renderable: RenderableId,
    pub visual: EnemyVisual,
    state: EnemyState,
    route: Vec<Vec3>,
    attack_cooldown_until: Option<f64>,
    attack_started_at: f64,
    attack_direction: Vec3,
    hit_flash_until: f64,
    death_started_at: f64,
    death_start_height: f32,
    sway_phase: f32,
}

impl EnemyEntity {
    /// `feet` is the ground contact point; `position` is the hit-volume centre.
    pub fn new(
        id: EnemyId,
        kind: EnemyKind,
        stats: EnemyStats,
        feet: Vec3,
        route: Vec<Vec3>,
        renderable: RenderableId,
    ) -> Self {
        Self {
            id,
            kind,
            stats,
            health: stats.max_health,
            max_health: stats.max_health,
            position: feet + Vec3::Y * (stats.body_height / 2.0),
            current_speed: stats.speed,
            renderable,
            visual: EnemyVisual::default(),
            state: EnemyState::Approaching,
            route,
            attack_cooldown_until: None,
            attack_started_at: 0.0,
            attack_direction: Vec3::ZERO,
            hit_flash_until: f64::NEG_INFINITY,
            death_started_at: 0.0,
            death_start_height: 0.0,
            sway_phase: (id.0 % 7) as f32 * 0.9,
        }
    }

    pub fn state(&self) -> EnemyState {
        self.state
    }

    pub fn is_live(&self) -> bool {
        matches!(self.state, EnemyState::Approaching | EnemyState::Attacking)
    }

    pub fn remaining_route(&self) -> &[Vec3] {
        &self.route
    }

    pub fn attack_cooldown_active(&self) -> bool {
        self.attack_cooldown_until.is_some()
    }

    pub fn feet_height(&self) -> f32 {
        self.position.y - self.stats.body_height / 2.0
    }

    pub fn is_headshot(&self, hit_point: Vec3) -> bool {
        let hit_height = hit_point.y - self.feet_height();
        hit_height > self.stats.body_height * self.kind.headshot_threshold()
    }

    pub fn tick(&mut self, context: &AiContext, tasks: &mut DeferredTaskQueue) -> Option<EnemyAttack> {
        self.visual.hit_flash = context.now < self.hit_flash_until;
        match self.state {
            EnemyState::Approaching => self.tick_approaching(context, tasks),
            EnemyState::Attacking => self.tick_attacking(context, tasks),
            EnemyState::Dying | EnemyState::Removed => None,
        }
    }

    fn tick_approaching(
        &mut self,
        context: &AiContext,
        tasks: &mut DeferredTaskQueue,
    ) -> Option<EnemyAttack> {
        let player_target = ground_projection(context.player_position, self.position.y);
        let player_distance = horizontal_distance(self.position, player_target);
        if player_distance < ATTACK_RANGE {
            return Some(self.begin_attack(player_target, context.now, tasks));
        }

        let target = match self.route.first() {
            Some(waypoint) => ground_projection(*waypoint, self.position.y),
            None => player_target,
        };
        let slow_factor = if context.slow_motion {
            SLOW_MOTION_FACTOR
        } else {
            1.0
        };
        self.current_speed = self.stats.speed * proximity_multiplier(player_distance) * slow_factor;

        let to_target = target - self.position;
        let distance = to_target.length();
        let max_step = self.current_speed * context.dt;
        let direction = to_target.normalize_or_zero();
        if max_step >= distance {
            self.position = target;
        } else {
            self.position += direction * max_step;
        }

        if self.kind == EnemyKind::Crawler && direction != Vec3::ZERO {
            let lateral = Vec3::new(-direction.z, 0.0, direction.x);
            let sway = (context.now as f32 * CRAWL_SWAY_FREQUENCY + self.sway_phase).sin();
            self.position += lateral * sway * CRAWL_SWAY_AMPLITUDE * context.dt * slow_factor;
        }

        if !self.route.is_empty()
            && horizontal_distance(self.position, target) <= ROUTE_ARRIVAL_THRESHOLD
        {
            self.route.remove(0);
        }

        let player_distance = horizontal_distance(self.position, player_target);
        if player_distance < ATTACK_RANGE {
            return Some(self.begin_attack(player_target, context.now, tasks));
        }
        None
    }

    fn tick_attacking(
        &mut self,
        context: &AiContext,
        tasks: &mut DeferredTaskQueue,
    ) -> Option<EnemyAttack> {
        if self.attack_cooldown_until.is_some() {
            // Range is deliberately not re-checked until the lunge completes.
            let phase = ((context.now - self.attack_started_at) / ATTACK_LUNGE_SECONDS)
                .clamp(0.0, 1.0) as f32;
            self.visual.lunge_offset = self.attack_direction * (PI * phase).sin() * LUNGE_DISTANCE;
            return None;
        }

        let player_target = ground_projection(context.player_position, self.position.y);
        if horizontal_distance(self.position, player_target) < ATTACK_RANGE {
            return Some(self.begin_attack(player_target, context.now, tasks));
        }
        self.state = EnemyState::Approaching;
        debug!(enemy_id = self.id.0, "enemy_resumed_approach");
        self.tick_approaching(context, tasks)
    }

    fn begin_attack(&mut self, target: Vec3, now: f64, tasks: &mut DeferredTaskQueue) -> EnemyAttack {
        self.state = EnemyState::Attacking;
        self.current_speed = 0.0;
        self.attack_started_at = now;
        self.attack_direction = (target - self.position).normalize_or_zero();
        let due_at = now + ATTACK_LUNGE_SECONDS;
        self.attack_cooldown_until = Some(due_at);
        tasks.schedule(
            TaskOwner::Enemy(self.id),
            TaskKind::AttackCooldownComplete,
            due_at,
        );
        debug!(enemy_id = self.id.0, damage = self.stats.damage, "enemy_attack");
        EnemyAttack {
            enemy_id: self.id,
            damage: self.stats.damage,
        }
    }

    pub fn apply_damage(
        &mut self,
        amount: i32,
        now: f64,
        tasks: &mut DeferredTaskQueue,
    ) -> DamageOutcome {
        if !self.is_live() {
            return DamageOutcome {
                killed: false,
                remaining_health: self.health,
            };
        }
        self.health -= amount.max(0);
        self.hit_flash_until = now + HIT_FLASH_SECONDS;
        self.visual.hit_flash = true;
        let killed = self.health <= 0;
        if killed {
            self.begin_dying(now, tasks);
        }
        DamageOutcome {
            killed,
            remaining_health: self.health,
        }
    }

    fn begin_dying(&mut self, now: f64, tasks: &mut DeferredTaskQueue) {
        self.state = EnemyState::Dying;
        self.current_speed = 0.0;
        self.attack_cooldown_until = None;
        self.visual.lunge_offset = Vec3::ZERO;
        self.death_started_at = now;
        self.death_start_height = self.position.y;
        tasks.cancel_owner(TaskOwner::Enemy(self.id));
        tasks.schedule(
            TaskOwner::Enemy(self.id),
            TaskKind::DeathAnimationComplete,
            now + DEATH_ANIMATION_SECONDS,
        );
        debug!(enemy_id = self.id.0, kind = self.kind.as_token(), "enemy_dying");
    }

    pub fn advance_death_animation(&mut self, now: f64) {
        if self.state != EnemyState::Dying {
            return;
        }
        let t = ((now - self.death_started_at) / DEATH_ANIMATION_SECONDS).clamp(0.0, 1.0) as f32;
        self.apply_death_pose(t);
    }

    fn apply_death_pose(&mut self, t: f32) {
        self.position.y = self.death_start_height * (1.0 - t);
        self.visual.rotation_degrees = DEATH_ROTATION_DEGREES * t;
        self.visual.opacity = 1.0 - t;
    }

    pub fn apply_task(&mut self, task: &DeferredTask) -> bool {
        match (task.kind, self.state) {
            (TaskKind::AttackCooldownComplete, EnemyState::Attacking) => {
                self.attack_cooldown_until = None;
                self.visual.lunge_offset = Vec3::ZERO;
                true
            }
            (TaskKind::DeathAnimationComplete, EnemyState::Dying) => {
                self.apply_death_pose(1.0);
                self.state = EnemyState::Removed;
                debug!(enemy_id = self.id.0, "enemy_removed");
                true
            }
            _ => false,
        }
    }
}

/// Maps distance 10 → 1.0 and 2 → 2.0 linearly; never below 1.
pub fn proximity_multiplier(distance: f32) -> f32 {
    let t = (PROXIMITY_FAR - distance) / (PROXIMITY_FAR - PROXIMITY_NEAR);
    (1.0 + t * (PROXIMITY_MAX_MULTIPLIER - 1.0)).max(1.0)
}

fn ground_projection(point: Vec3, height: f32) -> Vec3 {
    Vec3::new(point.x, height, point.z)
}

fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    let dx = b.x - a.x;
    let dz = b.z - a.z;
    (dx * dx + dz * dz).sqrt()
}

#[derive(Debug, Default)]
pub struct EnemyIdAllocator {
    next: u64,
}

impl EnemyIdAllocator {
    pub fn allocate(&mut self) -> EnemyId {
        let id = EnemyId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RosterCounts {
    pub approaching: u32,
    pub attacking: u32,
    pub dying: u32,
    pub removed: u32,
}

impl RosterCounts {
    pub fn total(&self) -> u32 {
        self.approaching + self.attacking + self.dying + self.removed
    }

    pub fn live(&self) -> u32 {
        self.approaching + self.attacking
    }
}

#[derive(Debug, Default)]
pub struct EnemyRoster {
    allocator: EnemyIdAllocator,
    entities: Vec<EnemyEntity>,
}

impl EnemyRoster {
    pub fn spawn(
        &mut self,
        kind: EnemyKind,
        stats: EnemyStats,
        feet: Vec3,
        route: Vec<Vec3>,
        renderable: RenderableId,
    ) -> EnemyId {
        let id = self.allocator.allocate();
        self.entities
            .push(EnemyEntity::new(id, kind, stats, feet, route, renderable));
        id
    }

    pub fn entities(&self) -> &[EnemyEntity] {
        &self.entities
    }

    pub fn find(&self, id: EnemyId) -> Option<&EnemyEntity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_mut(&mut self, id: EnemyId) -> Option<&mut EnemyEntity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn live(&self) -> impl Iterator<Item = &EnemyEntity> {
        self.entities.iter().filter(|entity| entity.is_live())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn counts(&self) -> RosterCounts {
        let mut counts = RosterCounts::default();
        for entity in &self.entities {
            match entity.state() {
                EnemyState::Approaching => counts.approaching += 1,
                EnemyState::Attacking => counts.attacking += 1,
                EnemyState::Dying => counts.dying += 1,
                EnemyState::Removed => counts.removed += 1,
            }
        }
        counts
    }

    pub fn is_cleared(&self) -> bool {
        !self.entities.is_empty()
            && self
                .entities
                .iter()
                .all(|entity| entity.state() == EnemyState::Removed)
    }

    pub fn tick_all(
        &mut self,
        context: &AiContext,
        tasks: &mut DeferredTaskQueue,
    ) -> Vec<EnemyAttack> {
        let mut attacks = Vec::new();
        for entity in &mut self.entities {
            match entity.state() {
                EnemyState::Approaching | EnemyState::Attacking => {
                    if let Some(attack) = entity.tick(context, tasks) {
                        attacks.push(attack);
                    }
                }
                EnemyState::Dying => entity.advance_death_animation(context.now),
                EnemyState::Removed => {}
            }
        }
        attacks
    }

    pub fn apply_task(&mut self, task: &DeferredTask) -> Option<&EnemyEntity> {
        let TaskOwner::Enemy(id) = task.owner else {
            return None;
        };
        let entity = self.find_mut(id)?;
        if entity.state() == EnemyState::Removed {
            return None;
        }
        if entity.apply_task(task) {
            Some(entity)
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }
}
