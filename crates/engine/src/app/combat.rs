use std::collections::HashMap;

use glam::Vec3;
use tracing::debug;

use super::collaborators::RenderableId;
use super::combo::ComboScoringLedger;
use super::enemy::{EnemyId, EnemyRoster};
use super::power_ups::{CollectibleId, CollectibleSet, PowerUpKind};
use super::tasks::DeferredTaskQueue;

pub const BASE_SHOT_DAMAGE: i32 = 50;
pub const DOUBLE_DAMAGE_MULTIPLIER: i32 = 2;
pub const HEADSHOT_MULTIPLIER: i32 = 2;
pub const MAX_SHOT_DISTANCE: f32 = 500.0;
const DIRECTION_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Normalizes `direction`; a zero direction yields a ray that hits nothing.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn toward(origin: Vec3, target: Vec3) -> Self {
        Self::new(origin, target - origin)
    }

    pub fn point_at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitShape {
    Box { center: Vec3, half_extents: Vec3 },
    Sphere { center: Vec3, radius: f32 },
    GroundPlane { height: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitVolume {
    pub renderable: RenderableId,
    pub shape: HitShape,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub renderable: RenderableId,
    pub point: Vec3,
    pub distance: f32,
}

pub trait HitTester {
    fn intersect(&self, ray: &Ray, candidates: &[HitVolume]) -> Vec<RayHit>;
}

#[derive(Debug, Clone, Copy)]
pub struct AnalyticHitTester {
    pub max_distance: f32,
}

impl Default for AnalyticHitTester {
    fn default() -> Self {
        Self {
            max_distance: MAX_SHOT_DISTANCE,
        }
    }
}

impl HitTester for AnalyticHitTester {
    fn intersect(&self, ray: &Ray, candidates: &[HitVolume]) -> Vec<RayHit> {
        if ray.direction == Vec3::ZERO {
            return Vec::new();
        }
        let mut hits = candidates
            .iter()
            .filter_map(|volume| {
                let distance = match volume.shape {
                    HitShape::Box {
                        center,
                        half_extents,
                    } => ray_box(ray, center - half_extents, center + half_extents),
                    HitShape::Sphere { center, radius } => ray_sphere(ray, center, radius),
                    HitShape::GroundPlane { height } => ray_ground(ray, height),
                }?;
                (distance <= self.max_distance).then(|| RayHit {
                    renderable: volume.renderable,
                    point: ray.point_at(distance),
                    distance,
                })
            })
            .collect::<Vec<_>>();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

fn ray_box(ray: &Ray, min: Vec3, max: Vec3) -> Option<f32> {
    let inv = |component: f32| {
        if component.abs() > DIRECTION_EPSILON {
            1.0 / component
        } else {
            f32::MAX
        }
    };
    let inv_dir = Vec3::new(inv(ray.direction.x), inv(ray.direction.y), inv(ray.direction.z));

    let t1 = (min.x - ray.origin.x) * inv_dir.x;
    let t2 = (max.x - ray.origin.x) * inv_dir.x;
    let t3 = (min.y - ray.origin.y) * inv_dir.y;
    let t4 = (max.y - ray.origin.y) * inv_dir.y;
    let t5 = (min.z - ray.origin.z) * inv_dir.z;
    let t6 = (max.z - ray.origin.z) * inv_dir.z;

    let tmin = t1.min(t2).max(t3.min(t4)).max(t5.min(t6));
    let tmax = t1.max(t2).min(t3.max(t4)).min(t5.max(t6));
    if tmax < 0.0 || tmin > tmax {
        return None;
    }
    Some(if tmin >= 0.0 { tmin } else { tmax })
}

fn ray_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    let offset = ray.origin - center;
    let b = offset.dot(ray.direction);
    let c = offset.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let root = discriminant.sqrt();
    let near = -b - root;
    let far = -b + root;
    if near >= 0.0 {
        Some(near)
    } else if far >= 0.0 {
        Some(far)
    } else {
        None
    }
}

fn ray_ground(ray: &Ray, height: f32) -> Option<f32> {
    if ray.direction.y > -DIRECTION_EPSILON {
        return None;
    }
    let distance = (height - ray.origin.y) / ray.direction.y;
    (distance >= 0.0).then_some(distance)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Enemy(EnemyId),
    Collectible(CollectibleId),
    Ground,
}

#[derive(Debug, Default, Clone)]
pub struct HitRegistry {
    targets: HashMap<RenderableId, HitTarget>,
}

impl HitRegistry {
    pub fn register(&mut self, renderable: RenderableId, target: HitTarget) {
        self.targets.insert(renderable, target);
    }

    pub fn unregister(&mut self, renderable: RenderableId) -> Option<HitTarget> {
        self.targets.remove(&renderable)
    }

    pub fn lookup(&self, renderable: RenderableId) -> Option<HitTarget> {
        self.targets.get(&renderable).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedTarget {
    None,
    Ground,
    Enemy(EnemyId),
    Collectible(CollectibleId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatEvent {
    pub ray: Ray,
    pub target: ResolvedTarget,
    pub hit_point: Option<Vec3>,
    pub headshot: bool,
    pub damage: i32,
    pub killed: bool,
    pub score_awarded: u64,
    pub collected: Option<PowerUpKind>,
}

impl CombatEvent {
    fn miss(ray: Ray) -> Self {
        Self {
            ray,
            target: ResolvedTarget::None,
            hit_point: None,
            headshot: false,
            damage: 0,
            killed: false,
            score_awarded: 0,
            collected: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShotStats {
    pub shots_fired: u32,
    pub hits: u32,
    pub headshot_kills: u32,
}

impl ShotStats {
    pub fn accuracy(&self) -> f32 {
        if self.shots_fired == 0 {
            0.0
        } else {
            self.hits as f32 / self.shots_fired as f32
        }
    }
}

pub struct CombatContext<'a> {
    pub now: f64,
    pub double_damage: bool,
    pub registry: &'a HitRegistry,
    pub roster: &'a mut EnemyRoster,
    pub collectibles: &'a mut CollectibleSet,
    pub combo: &'a mut ComboScoringLedger,
    pub tasks: &'a mut DeferredTaskQueue,
}

pub fn shot_damage(double_damage: bool, headshot: bool) -> i32 {
    let base = if double_damage {
        BASE_SHOT_DAMAGE * DOUBLE_DAMAGE_MULTIPLIER
    } else {
        BASE_SHOT_DAMAGE
    };
    if headshot {
        base * HEADSHOT_MULTIPLIER
    } else {
        base
    }
}

pub struct CombatResolver {
    tester: Box<dyn HitTester>,
    stats: ShotStats,
}

impl Default for CombatResolver {
    fn default() -> Self {
        Self::new(Box::new(AnalyticHitTester::default()))
    }
}

impl CombatResolver {
    pub fn new(tester: Box<dyn HitTester>) -> Self {
        Self {
            tester,
            stats: ShotStats::default(),
        }
    }

    pub fn stats(&self) -> ShotStats {
        self.stats
    }

    pub fn resolve(
        &mut self,
        ray: Ray,
        candidates: &[HitVolume],
        context: &mut CombatContext<'_>,
    ) -> CombatEvent {
        self.stats.shots_fired = self.stats.shots_fired.saturating_add(1);

        let hits = self.tester.intersect(&ray, candidates);
        let nearest = hits.into_iter().find_map(|hit| {
            let target = context.registry.lookup(hit.renderable)?;
            let eligible = match target {
                HitTarget::Enemy(id) => context.roster.find(id).is_some_and(|enemy| enemy.is_live()),
                HitTarget::Collectible(id) => context
                    .collectibles
                    .find(id)
                    .is_some_and(|item| !item.is_collected()),
                HitTarget::Ground => true,
            };
            eligible.then_some((target, hit))
        });

        let Some((target, hit)) = nearest else {
            return CombatEvent::miss(ray);
        };

        match target {
            HitTarget::Ground => CombatEvent {
                target: ResolvedTarget::Ground,
                hit_point: Some(hit.point),
                ..CombatEvent::miss(ray)
            },
            HitTarget::Collectible(id) => {
                self.stats.hits = self.stats.hits.saturating_add(1);
                let collected = context
                    .collectibles
                    .find_mut(id)
                    .and_then(|item| item.collect());
                CombatEvent {
                    target: ResolvedTarget::Collectible(id),
                    hit_point: Some(hit.point),
                    collected,
                    ..CombatEvent::miss(ray)
                }
            }
            HitTarget::Enemy(id) => self.resolve_enemy_hit(ray, id, hit.point, context),
        }
    }

    fn resolve_enemy_hit(
        &mut self,
        ray: Ray,
        enemy_id: EnemyId,
        hit_point: Vec3,
        context: &mut CombatContext<'_>,
    ) -> CombatEvent {
        self.stats.hits = self.stats.hits.saturating_add(1);
        let Some(enemy) = context.roster.find_mut(enemy_id) else {
            return CombatEvent::miss(ray);
        };

        let headshot = enemy.is_headshot(hit_point);
        let damage = shot_damage(context.double_damage, headshot);
        let outcome = enemy.apply_damage(damage, context.now, context.tasks);
        let score_value = u64::from(enemy.stats.score_value);
        debug!(
            enemy_id = enemy_id.0,
            damage,
            headshot,
            killed = outcome.killed,
            remaining_health = outcome.remaining_health,
            "shot_resolved"
        );

        let mut score_awarded = 0;
        if outcome.killed {
            if headshot {
                self.stats.headshot_kills = self.stats.headshot_kills.saturating_add(1);
            }
            context.combo.add_score(score_value);
            score_awarded = score_value + context.combo.on_kill();
        } else {
            context.combo.on_non_kill_hit();
        }

        CombatEvent {
            ray,
            target: ResolvedTarget::Enemy(enemy_id),
            hit_point: Some(hit_point),
            headshot,
            damage,
            killed: outcome.killed,
            score_awarded,
            collected: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::enemy::{EnemyKind, EnemyState};

    struct Arena {
        registry: HitRegistry,
        roster: EnemyRoster,
        collectibles: CollectibleSet,
        combo: ComboScoringLedger,
        tasks: DeferredTaskQueue,
        volumes: Vec<HitVolume>,
        next_renderable: u64,
    }

    impl Arena {
        fn new() -> Self {
            let mut registry = HitRegistry::default();
            registry.register(RenderableId(0), HitTarget::Ground);
            Self {
                registry,
                roster: EnemyRoster::default(),
                collectibles: CollectibleSet::default(),
                combo: ComboScoringLedger::default(),
                tasks: DeferredTaskQueue::default(),
                volumes: Vec::new(),
                next_renderable: 1,
            }
        }

        fn spawn_enemy(&mut self, kind: EnemyKind, feet: Vec3) -> EnemyId {
            let renderable = RenderableId(self.next_renderable);
            self.next_renderable += 1;
            let id = self
                .roster
                .spawn(kind, kind.default_stats(), feet, Vec::new(), renderable);
            self.registry.register(renderable, HitTarget::Enemy(id));
            id
        }

        fn spawn_collectible(&mut self, kind: PowerUpKind, position: Vec3) -> CollectibleId {
            let renderable = RenderableId(self.next_renderable);
            self.next_renderable += 1;
            let id = self.collectibles.spawn(kind, position, renderable);
            self.registry
                .register(renderable, HitTarget::Collectible(id));
            id
        }

        fn rebuild_volumes(&mut self) {
            self.volumes.clear();
            self.volumes.push(HitVolume {
                renderable: RenderableId(0),
                shape: HitShape::GroundPlane { height: 0.0 },
            });
            for enemy in self.roster.entities() {
                self.volumes.push(HitVolume {
                    renderable: enemy.renderable,
                    shape: HitShape::Box {
                        center: enemy.position,
                        half_extents: Vec3::new(
                            enemy.stats.hit_radius,
                            enemy.stats.body_height / 2.0,
                            enemy.stats.hit_radius,
                        ),
                    },
                });
            }
            for item in self.collectibles.items() {
                self.volumes.push(HitVolume {
                    renderable: item.renderable,
                    shape: HitShape::Sphere {
                        center: item.position,
                        radius: item.radius,
                    },
                });
            }
        }

        fn shoot(&mut self, resolver: &mut CombatResolver, ray: Ray, double_damage: bool) -> CombatEvent {
            self.rebuild_volumes();
            let mut context = CombatContext {
                now: 0.0,
                double_damage,
                registry: &self.registry,
                roster: &mut self.roster,
                collectibles: &mut self.collectibles,
                combo: &mut self.combo,
                tasks: &mut self.tasks,
            };
            resolver.resolve(ray, &self.volumes, &mut context)
        }
    }

    fn level_ray(height: f32) -> Ray {
        Ray::new(Vec3::new(0.0, height, 0.0), Vec3::NEG_Z)
    }

    #[test]
    fn empty_candidate_set_is_a_miss() {
        let mut resolver = CombatResolver::default();
        let mut arena = Arena::new();
        let mut context = CombatContext {
            now: 0.0,
            double_damage: false,
            registry: &arena.registry,
            roster: &mut arena.roster,
            collectibles: &mut arena.collectibles,
            combo: &mut arena.combo,
            tasks: &mut arena.tasks,
        };
        let event = resolver.resolve(level_ray(1.0), &[], &mut context);
        assert_eq!(event.target, ResolvedTarget::None);
        assert_eq!(resolver.stats().shots_fired, 1);
        assert_eq!(resolver.stats().hits, 0);
    }

    #[test]
    fn walker_body_hit_deals_base_damage() {
        let mut resolver = CombatResolver::default();
        let mut arena = Arena::new();
        let id = arena.spawn_enemy(EnemyKind::Walker, Vec3::new(0.0, 0.0, -10.0));

        let event = arena.shoot(&mut resolver, level_ray(0.9), false);
        assert_eq!(event.target, ResolvedTarget::Enemy(id));
        assert!(!event.headshot);
        assert_eq!(event.damage, 50);
        assert_eq!(arena.roster.find(id).expect("walker").health, 50);
    }

    #[test]
    fn walker_headshot_doubles_damage() {
        let mut resolver = CombatResolver::default();
        let mut arena = Arena::new();
        let id = arena.spawn_enemy(EnemyKind::Walker, Vec3::new(0.0, 0.0, -10.0));

        let event = arena.shoot(&mut resolver, level_ray(1.7), false);
        assert!(event.headshot);
        assert_eq!(event.damage, 100);
        assert!(event.killed);
        assert_eq!(arena.roster.find(id).expect("walker").health, 0);
        assert_eq!(resolver.stats().headshot_kills, 1);
    }

    #[test]
    fn double_damage_headshot_deals_two_hundred() {
        let mut resolver = CombatResolver::default();
        let mut arena = Arena::new();
        let id = arena.spawn_enemy(EnemyKind::Tank, Vec3::new(0.0, 0.0, -10.0));

        let event = arena.shoot(&mut resolver, level_ray(2.3), true);
        assert!(event.headshot);
        assert_eq!(event.damage, 200);
        assert_eq!(arena.roster.find(id).expect("tank").health, 100);
    }

    #[test]
    fn headshot_threshold_differs_between_crawler_and_walker() {
        let mut resolver = CombatResolver::default();
        let mut arena = Arena::new();
        let crawler = arena.spawn_enemy(EnemyKind::Crawler, Vec3::new(0.0, 0.0, -10.0));
        let crawler_height = EnemyKind::Crawler.default_stats().body_height;
        let event = arena.shoot(&mut resolver, level_ray(0.8 * crawler_height), false);
        assert_eq!(event.target, ResolvedTarget::Enemy(crawler));
        assert!(!event.headshot);

        let mut arena = Arena::new();
        arena.spawn_enemy(EnemyKind::Walker, Vec3::new(0.0, 0.0, -10.0));
        let walker_height = EnemyKind::Walker.default_stats().body_height;
        let event = arena.shoot(&mut resolver, level_ray(0.8 * walker_height), false);
        assert!(event.headshot);
    }

    #[test]
    fn two_body_hits_kill_a_walker_and_count_one_kill() {
        let mut resolver = CombatResolver::default();
        let mut arena = Arena::new();
        let id = arena.spawn_enemy(EnemyKind::Walker, Vec3::new(0.0, 0.0, -10.0));

        let first = arena.shoot(&mut resolver, level_ray(0.9), false);
        assert!(!first.killed);
        assert_eq!(
            arena.roster.find(id).expect("walker").state(),
            EnemyState::Approaching
        );

        let second = arena.shoot(&mut resolver, level_ray(0.9), false);
        assert!(second.killed);
        assert!(!second.headshot);
        assert_eq!(arena.roster.find(id).expect("walker").health, 0);
        assert_eq!(
            arena.roster.find(id).expect("walker").state(),
            EnemyState::Dying
        );
        assert_eq!(arena.combo.streak(), 1);
        assert_eq!(second.score_awarded, 100);
        assert_eq!(resolver.stats().shots_fired, 2);
        assert_eq!(resolver.stats().hits, 2);
    }

    #[test]
    fn nearest_live_enemy_wins_and_dying_enemies_are_skipped() {
        let mut resolver = CombatResolver::default();
        let mut arena = Arena::new();
        let near = arena.spawn_enemy(EnemyKind::Runner, Vec3::new(0.0, 0.0, -5.0));
        let far = arena.spawn_enemy(EnemyKind::Walker, Vec3::new(0.0, 0.0, -12.0));

        let first = arena.shoot(&mut resolver, level_ray(0.8), false);
        assert_eq!(first.target, ResolvedTarget::Enemy(near));
        assert!(first.killed);

        let second = arena.shoot(&mut resolver, level_ray(0.8), false);
        assert_eq!(second.target, ResolvedTarget::Enemy(far));
    }

    #[test]
    fn ground_blocks_shots_and_does_not_count_as_hit() {
        let mut resolver = CombatResolver::default();
        let mut arena = Arena::new();
        arena.spawn_enemy(EnemyKind::Walker, Vec3::new(0.0, 0.0, -30.0));

        let ray = Ray::toward(Vec3::new(0.0, 1.6, 0.0), Vec3::new(0.0, 0.0, -5.0));
        let event = arena.shoot(&mut resolver, ray, false);
        assert_eq!(event.target, ResolvedTarget::Ground);
        assert_eq!(resolver.stats().hits, 0);
    }

    #[test]
    fn non_kill_hit_breaks_combo() {
        let mut resolver = CombatResolver::default();
        let mut arena = Arena::new();
        arena.combo.on_kill();
        arena.combo.on_kill();
        arena.spawn_enemy(EnemyKind::Tank, Vec3::new(0.0, 0.0, -10.0));

        arena.shoot(&mut resolver, level_ray(0.5), false);
        assert_eq!(arena.combo.streak(), 0);
    }

    #[test]
    fn collectible_hit_collects_without_damage() {
        let mut resolver = CombatResolver::default();
        let mut arena = Arena::new();
        let id = arena.spawn_collectible(PowerUpKind::DoubleDamage, Vec3::new(0.0, 1.0, -4.0));
        arena.combo.on_kill();

        let event = arena.shoot(&mut resolver, level_ray(1.0), false);
        assert_eq!(event.target, ResolvedTarget::Collectible(id));
        assert_eq!(event.collected, Some(PowerUpKind::DoubleDamage));
        assert_eq!(event.damage, 0);
        assert_eq!(arena.combo.streak(), 1);
        assert_eq!(resolver.stats().hits, 1);

        let again = arena.shoot(&mut resolver, level_ray(1.0), false);
        assert_eq!(again.target, ResolvedTarget::None);
    }

    #[test]
    fn unregistered_renderables_are_ignored() {
        let tester = AnalyticHitTester::default();
        let hits = tester.intersect(
            &level_ray(1.0),
            &[HitVolume {
                renderable: RenderableId(77),
                shape: HitShape::Sphere {
                    center: Vec3::new(0.0, 1.0, -3.0),
                    radius: 0.5,
                },
            }],
        );
        assert_eq!(hits.len(), 1);
        assert!((hits[0].distance - 2.5).abs() < 1e-4);

        let mut resolver = CombatResolver::default();
        let mut arena = Arena::new();
        let mut context = CombatContext {
            now: 0.0,
            double_damage: false,
            registry: &arena.registry,
            roster: &mut arena.roster,
            collectibles: &mut arena.collectibles,
            combo: &mut arena.combo,
            tasks: &mut arena.tasks,
        };
        let volumes = [HitVolume {
            renderable: RenderableId(77),
            shape: HitShape::Sphere {
                center: Vec3::new(0.0, 1.0, -3.0),
                radius: 0.5,
            },
        }];
        let event = resolver.resolve(level_ray(1.0), &volumes, &mut context);
        assert_eq!(event.target, ResolvedTarget::None);
    }

    #[test]
    fn hit_tester_orders_by_distance() {
        let tester = AnalyticHitTester::default();
        let hits = tester.intersect(
            &level_ray(1.0),
            &[
                HitVolume {
                    renderable: RenderableId(1),
                    shape: HitShape::Box {
                        center: Vec3::new(0.0, 1.0, -9.0),
                        half_extents: Vec3::splat(0.5),
                    },
                },
                HitVolume {
                    renderable: RenderableId(2),
                    shape: HitShape::Box {
                        center: Vec3::new(0.0, 1.0, -4.0),
                        half_extents: Vec3::splat(0.5),
                    },
                },
            ],
        );
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].renderable, RenderableId(2));
        assert!((hits[0].distance - 3.5).abs() < 1e-4);
        assert!((hits[0].point.z - -3.5).abs() < 1e-4);
    }
}
