use std::collections::{HashSet, VecDeque};

use glam::Vec3;
use tracing::{debug, info, warn};

use super::camera::{CameraPose, CameraRig, CameraWriteError, CameraWriter};
use super::collaborators::{
    default_renderable_for_enemy, Collaborators, HudSnapshot, LeaderboardRecord, MissionOutcome,
    RenderableDesc, RenderableId, RenderableIdAllocator, RenderableKind,
};
use super::combat::{
    AnalyticHitTester, CombatContext, CombatEvent, CombatResolver, HitRegistry, HitShape,
    HitTarget, HitVolume, Ray, ResolvedTarget, ShotStats, MAX_SHOT_DISTANCE,
};
use super::combo::{ComboScoringLedger, ComboSnapshot};
use super::enemy::{AiContext, EnemyKind, EnemyRoster, EnemyState, RosterCounts};
use super::events::{SessionEvent, SessionEventBus, SessionEventCounts};
use super::lifecycle::{LifecycleError, LifecycleEvent, LifecycleState, SceneLifecycleCoordinator};
use super::player::PlayerState;
use super::power_ups::{CollectibleSet, ModifierState, PowerUpKind};
use super::spawn_scheduler::{EncounterSpawnScheduler, SpawnListener};
use super::tasks::{DeferredTaskQueue, TaskKind, TaskOwner};
use super::traversal::{PathTraversalController, TraversalTick};
use crate::content::MissionDatabase;

pub const GROUND_HEIGHT: f32 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemId {
    LifecycleGate,
    Traversal,
    SpawnScheduler,
    DeferredTasks,
    EnemyAi,
    Combat,
    Combo,
    RosterCheck,
    UiCallbacks,
    CameraResync,
}

impl SystemId {
    pub fn name(self) -> &'static str {
        match self {
            Self::LifecycleGate => "LifecycleGate",
            Self::Traversal => "Traversal",
            Self::SpawnScheduler => "SpawnScheduler",
            Self::DeferredTasks => "DeferredTasks",
            Self::EnemyAi => "EnemyAi",
            Self::Combat => "Combat",
            Self::Combo => "Combo",
            Self::RosterCheck => "RosterCheck",
            Self::UiCallbacks => "UiCallbacks",
            Self::CameraResync => "CameraResync",
        }
    }
}

/// Camera resync is last; nothing may touch the camera after it.
pub const SYSTEM_ORDER: [SystemId; 10] = [
    SystemId::LifecycleGate,
    SystemId::Traversal,
    SystemId::SpawnScheduler,
    SystemId::DeferredTasks,
    SystemId::EnemyAi,
    SystemId::Combat,
    SystemId::Combo,
    SystemId::RosterCheck,
    SystemId::UiCallbacks,
    SystemId::CameraResync,
];

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub player_max_health: u32,
    pub magazine_size: u32,
    pub reload_seconds: f64,
    pub double_damage_seconds: f64,
    pub slow_motion_seconds: f64,
    pub max_shot_distance: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            player_max_health: 100,
            magazine_size: 12,
            reload_seconds: 1.5,
            double_damage_seconds: 10.0,
            slow_motion_seconds: 8.0,
            max_shot_distance: MAX_SHOT_DISTANCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerAction {
    Shoot(Ray),
    Reload,
}

#[derive(Debug, Clone, PartialEq)]
enum UiNotice {
    Headshot,
    PowerUp(PowerUpKind),
    SceneTitle(String),
}

struct RunState {
    lifecycle: SceneLifecycleCoordinator,
    traversal: PathTraversalController,
    roster: EnemyRoster,
    collectibles: CollectibleSet,
    registry: HitRegistry,
    tasks: DeferredTaskQueue,
    combo: ComboScoringLedger,
    resolver: CombatResolver,
    player: PlayerState,
    modifiers: ModifierState,
    camera: CameraRig,
    renderables: RenderableIdAllocator,
    ground: RenderableId,
    scene_path_cursor: usize,
    pending_actions: VecDeque<PlayerAction>,
    pending_ui: Vec<UiNotice>,
    scenes_cleared: usize,
    outcome_recorded: bool,
}

impl RunState {
    fn new(mission: &MissionDatabase, config: &SessionConfig) -> Self {
        let mut renderables = RenderableIdAllocator::default();
        let ground = renderables.allocate();
        let mut registry = HitRegistry::default();
        registry.register(ground, HitTarget::Ground);
        Self {
            lifecycle: SceneLifecycleCoordinator::new(mission.scene_poses()),
            traversal: PathTraversalController::new(mission.paths().to_vec()),
            roster: EnemyRoster::default(),
            collectibles: CollectibleSet::default(),
            registry,
            tasks: DeferredTaskQueue::default(),
            combo: ComboScoringLedger::default(),
            resolver: CombatResolver::new(Box::new(AnalyticHitTester {
                max_distance: config.max_shot_distance,
            })),
            player: PlayerState::new(config.player_max_health, config.magazine_size),
            modifiers: ModifierState::default(),
            camera: CameraRig::default(),
            renderables,
            ground,
            scene_path_cursor: 0,
            pending_actions: VecDeque::new(),
            pending_ui: Vec::new(),
            scenes_cleared: 0,
            outcome_recorded: false,
        }
    }
}

pub struct GameSession {
    config: SessionConfig,
    mission: MissionDatabase,
    collaborators: Collaborators,
    scheduler: EncounterSpawnScheduler,
    loaded_models: HashSet<EnemyKind>,
    events: SessionEventBus,
    last_tick_order: Vec<SystemId>,
    tick_count: u64,
    run: RunState,
}

impl GameSession {
    pub fn new(
        mission: MissionDatabase,
        config: SessionConfig,
        collaborators: Collaborators,
    ) -> Self {
        let run = RunState::new(&mission, &config);
        Self {
            config,
            mission,
            collaborators,
            scheduler: EncounterSpawnScheduler::default(),
            loaded_models: HashSet::new(),
            events: SessionEventBus::default(),
            last_tick_order: Vec::with_capacity(SYSTEM_ORDER.len()),
            tick_count: 0,
            run,
        }
    }

    pub fn begin(&mut self, now: f64) -> Result<(), LifecycleError> {
        let event = self.run.lifecycle.begin()?;
        if let Some(scene) = self.mission.scene(0) {
            if let Err(err) = self
                .run
                .camera
                .write(CameraWriter::SceneTransition, scene.camera_pose())
            {
                warn!(error = %err, "scene_camera_placement_rejected");
            }
        }
        self.handle_lifecycle_event(event, now);
        Ok(())
    }

    pub fn restart(&mut self, now: f64) -> Result<(), LifecycleError> {
        self.clear_scene_entities();
        self.run = RunState::new(&self.mission, &self.config);
        self.events.clear();
        self.last_tick_order.clear();
        info!(mission = self.mission.mission_id(), "session_restarted");
        self.begin(now)
    }

    pub fn tick(&mut self, now: f64, dt: f32) {
        self.run.camera.unseal();
        self.last_tick_order.clear();
        let mut traversal_completed = false;
        for system_id in SYSTEM_ORDER {
            self.last_tick_order.push(system_id);
            match system_id {
                SystemId::LifecycleGate => self.run_lifecycle_gate(now),
                SystemId::Traversal => traversal_completed = self.run_traversal(now),
                SystemId::SpawnScheduler => self.run_spawn_scheduler(now, traversal_completed),
                SystemId::DeferredTasks => self.run_deferred_tasks(now),
                SystemId::EnemyAi => self.run_enemy_ai(now, dt),
                SystemId::Combat => self.run_combat(now),
                SystemId::Combo => self.run_combo(now, dt),
                SystemId::RosterCheck => self.run_roster_check(now),
                SystemId::UiCallbacks => self.run_ui_callbacks(),
                SystemId::CameraResync => self.run_camera_resync(now),
            }
        }
        self.tick_count = self.tick_count.saturating_add(1);
        self.events.finish_tick_rollover();
    }

    pub fn queue_action(&mut self, action: PlayerAction) {
        self.run.pending_actions.push_back(action);
    }

    pub fn queue_shot(&mut self, ray: Ray) {
        self.queue_action(PlayerAction::Shoot(ray));
    }

    pub fn queue_reload(&mut self) {
        self.queue_action(PlayerAction::Reload);
    }

    pub fn resolve_door_interaction(&mut self, now: f64) -> Result<(), LifecycleError> {
        let event = self
            .run
            .lifecycle
            .resolve_door_interaction(now, &mut self.run.camera)?;
        self.handle_lifecycle_event(event, now);
        Ok(())
    }

    /// Free-look camera write; rejected whenever another writer owns the camera.
    pub fn write_free_look(&mut self, pose: CameraPose) -> Result<(), CameraWriteError> {
        self.run.camera.write(CameraWriter::FreeLook, pose)
    }

    pub fn on_enemy_spawn(&mut self, listener: SpawnListener) {
        self.scheduler.on_enemy_spawn(listener);
    }

    pub fn notify_asset_loaded(&mut self, kind: EnemyKind) {
        if !self.loaded_models.insert(kind) {
            return;
        }
        let model = default_renderable_for_enemy(kind);
        let mut swapped = 0_u32;
        for enemy in self.run.roster.live().filter(|enemy| enemy.kind == kind) {
            self.collaborators
                .scene_graph
                .swap_visual(enemy.renderable, &model);
            swapped += 1;
        }
        info!(kind = kind.as_token(), swapped, "enemy_model_loaded");
    }

    pub fn mission(&self) -> &MissionDatabase {
        &self.mission
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.run.lifecycle.state()
    }

    pub fn scene_index(&self) -> usize {
        self.run.lifecycle.scene_index()
    }

    pub fn total_scenes(&self) -> usize {
        self.run.lifecycle.total_scenes()
    }

    pub fn door_pending(&self) -> bool {
        self.run.lifecycle.door_pending()
    }

    pub fn scenes_cleared(&self) -> usize {
        self.run.scenes_cleared
    }

    pub fn roster(&self) -> &EnemyRoster {
        &self.run.roster
    }

    pub fn roster_counts(&self) -> RosterCounts {
        self.run.roster.counts()
    }

    pub fn collectibles(&self) -> &CollectibleSet {
        &self.run.collectibles
    }

    pub fn combo(&self) -> ComboSnapshot {
        self.run.combo.snapshot()
    }

    pub fn score(&self) -> u64 {
        self.run.combo.score()
    }

    pub fn shot_stats(&self) -> ShotStats {
        self.run.resolver.stats()
    }

    pub fn player(&self) -> &PlayerState {
        &self.run.player
    }

    pub fn modifiers(&self) -> ModifierState {
        self.run.modifiers
    }

    pub fn camera(&self) -> &CameraRig {
        &self.run.camera
    }

    pub fn camera_pose(&self) -> CameraPose {
        self.run.camera.pose()
    }

    pub fn traversal(&self) -> &PathTraversalController {
        &self.run.traversal
    }

    pub fn pending_task_count(&self) -> usize {
        self.run.tasks.len()
    }

    pub fn last_tick_order(&self) -> &[SystemId] {
        &self.last_tick_order
    }

    pub fn last_tick_events(&self) -> &[SessionEvent] {
        self.events.last_tick_events()
    }

    pub fn last_tick_counts(&self) -> SessionEventCounts {
        self.events.last_tick_counts()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn hud_snapshot(&self) -> HudSnapshot {
        let player = &self.run.player;
        HudSnapshot {
            health: player.health(),
            max_health: player.max_health(),
            ammo: player.ammo(),
            magazine_size: player.magazine_size(),
            reloading: player.is_reloading(),
            score: self.run.combo.score(),
            combo_streak: self.run.combo.streak(),
            scene_index: self.scene_index(),
            total_scenes: self.total_scenes(),
            enemies_remaining: self.run.roster.counts().live(),
            lifecycle: self.lifecycle_state(),
        }
    }

    pub fn hit_volumes(&self) -> Vec<HitVolume> {
        let mut volumes = Vec::with_capacity(1 + self.run.roster.len());
        volumes.push(HitVolume {
            renderable: self.run.ground,
            shape: HitShape::GroundPlane {
                height: GROUND_HEIGHT,
            },
        });
        volumes.extend(self.run.roster.live().map(|enemy| HitVolume {
            renderable: enemy.renderable,
            shape: HitShape::Box {
                center: enemy.position,
                half_extents: Vec3::new(
                    enemy.stats.hit_radius,
                    enemy.stats.body_height / 2.0,
                    enemy.stats.hit_radius,
                ),
            },
        }));
        volumes.extend(self.run.collectibles.available().map(|item| HitVolume {
            renderable: item.renderable,
            shape: HitShape::Sphere {
                center: item.position,
                radius: item.radius,
            },
        }));
        volumes
    }

    fn gameplay_active(&self) -> bool {
        self.run.lifecycle.gameplay_systems_active()
    }

    fn run_lifecycle_gate(&mut self, now: f64) {
        let events = self.run.lifecycle.advance(now, &mut self.run.camera);
        for event in events {
            self.handle_lifecycle_event(event, now);
        }
    }

    fn run_traversal(&mut self, now: f64) -> bool {
        if !self.gameplay_active() {
            return false;
        }
        match self.run.traversal.tick(now, &mut self.run.camera) {
            TraversalTick::Completed { path_index } => {
                self.events
                    .emit(SessionEvent::TraversalCompleted { path_index });
                true
            }
            TraversalTick::Idle | TraversalTick::Moving { .. } => false,
        }
    }

    fn run_spawn_scheduler(&mut self, now: f64, traversal_completed: bool) {
        if !self.gameplay_active() {
            return;
        }
        let requests = self.scheduler.evaluate(&mut self.run.traversal);
        for request in requests {
            self.spawn_enemy(request.kind, request.position, request.sub_path);
        }
        // Chained paths start only after the finished path's last triggers fired.
        if traversal_completed {
            self.start_next_scene_path(now);
        }
    }

    fn run_enemy_ai(&mut self, now: f64, dt: f32) {
        if !self.gameplay_active() {
            return;
        }
        let context = AiContext {
            now,
            dt,
            player_position: self.run.camera.position(),
            slow_motion: self.run.modifiers.slow_motion(),
        };
        let attacks = self.run.roster.tick_all(&context, &mut self.run.tasks);
        for attack in attacks {
            if self.run.player.is_dead() {
                break;
            }
            let died = self.run.player.take_damage(attack.damage);
            self.events.emit(SessionEvent::PlayerDamaged {
                enemy_id: attack.enemy_id,
                amount: attack.damage,
                remaining_health: self.run.player.health(),
            });
            if died {
                self.handle_player_death(now);
            }
        }
    }

    fn run_deferred_tasks(&mut self, now: f64) {
        for task in self.run.tasks.drain_due(now) {
            match task.owner {
                TaskOwner::Enemy(_) => {
                    let removed = self
                        .run
                        .roster
                        .apply_task(&task)
                        .filter(|enemy| enemy.state() == EnemyState::Removed)
                        .map(|enemy| (enemy.id, enemy.renderable));
                    if let Some((enemy_id, renderable)) = removed {
                        self.run.registry.unregister(renderable);
                        self.collaborators.scene_graph.remove(renderable);
                        self.events.emit(SessionEvent::EnemyRemoved { enemy_id });
                    }
                }
                TaskOwner::Player => {
                    if task.kind == TaskKind::ReloadComplete && self.run.player.finish_reload() {
                        debug!(ammo = self.run.player.ammo(), "reload_completed");
                        self.events.emit(SessionEvent::ReloadCompleted);
                    }
                }
            }
        }
    }

    fn run_combat(&mut self, now: f64) {
        let actions = self.run.pending_actions.drain(..).collect::<Vec<_>>();
        if actions.is_empty() {
            return;
        }
        if !self.gameplay_active() {
            debug!(dropped = actions.len(), "player_actions_dropped");
            return;
        }
        for action in actions {
            match action {
                PlayerAction::Shoot(ray) => self.fire(ray, now),
                PlayerAction::Reload => {
                    let reload_seconds = self.config.reload_seconds;
                    if self
                        .run
                        .player
                        .begin_reload(now, reload_seconds, &mut self.run.tasks)
                    {
                        self.events.emit(SessionEvent::ReloadStarted);
                    }
                }
            }
        }
    }

    fn run_combo(&mut self, now: f64, dt: f32) {
        if matches!(
            self.run.lifecycle.state(),
            LifecycleState::Gameplay | LifecycleState::SceneTransition
        ) {
            self.run.combo.tick(dt);
        }
        for kind in self.run.modifiers.expire(now) {
            info!(kind = kind.as_token(), "power_up_expired");
            self.events.emit(SessionEvent::PowerUpExpired { kind });
        }
    }

    fn run_roster_check(&mut self, now: f64) {
        // Pending path triggers may still add to the roster.
        if !self.gameplay_active() || self.run.traversal.is_moving() {
            return;
        }
        let events = self
            .run
            .lifecycle
            .check_roster(&self.run.roster, now, &mut self.run.camera);
        for event in events {
            self.handle_lifecycle_event(event, now);
        }
    }

    fn run_ui_callbacks(&mut self) {
        for notice in std::mem::take(&mut self.run.pending_ui) {
            match notice {
                UiNotice::Headshot => self.collaborators.ui.show_headshot_indicator(),
                UiNotice::PowerUp(kind) => self.collaborators.ui.show_power_up_message(kind),
                UiNotice::SceneTitle(title) => self.collaborators.ui.show_scene_title(&title),
            }
        }
        let hud = self.hud_snapshot();
        self.collaborators.ui.update_hud(&hud);
    }

    fn run_camera_resync(&mut self, now: f64) {
        if self.run.traversal.is_moving() {
            self.run.traversal.force_resync(now, &mut self.run.camera);
        }
    }

    fn fire(&mut self, ray: Ray, now: f64) {
        if !self.run.player.try_fire() {
            debug!(
                ammo = self.run.player.ammo(),
                reloading = self.run.player.is_reloading(),
                "dry_fire"
            );
            self.events.emit(SessionEvent::DryFire);
            return;
        }

        let candidates = self.hit_volumes();
        let run = &mut self.run;
        let mut context = CombatContext {
            now,
            double_damage: run.modifiers.double_damage(),
            registry: &run.registry,
            roster: &mut run.roster,
            collectibles: &mut run.collectibles,
            combo: &mut run.combo,
            tasks: &mut run.tasks,
        };
        let event = run.resolver.resolve(ray, &candidates, &mut context);
        self.apply_combat_event(&event, now);
    }

    fn apply_combat_event(&mut self, event: &CombatEvent, now: f64) {
        self.events.emit(SessionEvent::ShotFired {
            target: event.target,
            headshot: event.headshot,
            damage: event.damage,
            killed: event.killed,
        });
        match event.target {
            ResolvedTarget::Enemy(enemy_id) => {
                if event.headshot {
                    self.run.pending_ui.push(UiNotice::Headshot);
                }
                if event.killed {
                    info!(
                        enemy_id = enemy_id.0,
                        headshot = event.headshot,
                        score_awarded = event.score_awarded,
                        streak = self.run.combo.streak(),
                        "enemy_killed"
                    );
                    self.events.emit(SessionEvent::EnemyKilled {
                        enemy_id,
                        headshot: event.headshot,
                        score_awarded: event.score_awarded,
                    });
                }
            }
            ResolvedTarget::Collectible(id) => {
                if let Some(renderable) = self.run.collectibles.find(id).map(|item| item.renderable) {
                    self.run.registry.unregister(renderable);
                    self.collaborators.scene_graph.remove(renderable);
                }
                if let Some(kind) = event.collected {
                    self.apply_power_up(kind, now);
                }
            }
            ResolvedTarget::Ground | ResolvedTarget::None => {}
        }
    }

    fn apply_power_up(&mut self, kind: PowerUpKind, now: f64) {
        match kind {
            PowerUpKind::DoubleDamage => {
                self.run
                    .modifiers
                    .activate(kind, now, self.config.double_damage_seconds);
            }
            PowerUpKind::SlowMotion => {
                self.run
                    .modifiers
                    .activate(kind, now, self.config.slow_motion_seconds);
            }
            PowerUpKind::HealthPack => self.run.player.heal_full(),
            PowerUpKind::AmmoRefill => self.run.player.refill_ammo(&mut self.run.tasks),
        }
        info!(kind = kind.as_token(), "power_up_applied");
        self.events.emit(SessionEvent::PowerUpCollected { kind });
        self.run.pending_ui.push(UiNotice::PowerUp(kind));
    }

    fn handle_player_death(&mut self, now: f64) {
        self.run.traversal.stop(&mut self.run.camera);
        if let Some(event) = self.run.lifecycle.signal_player_dead(&mut self.run.camera) {
            self.handle_lifecycle_event(event, now);
        }
    }

    fn handle_lifecycle_event(&mut self, event: LifecycleEvent, now: f64) {
        self.events.emit(SessionEvent::Lifecycle(event));
        match event {
            LifecycleEvent::SceneEntered { scene_index } => self.enter_scene(scene_index, now),
            LifecycleEvent::SceneCleared { .. } => {
                self.run.scenes_cleared = self.run.scenes_cleared.saturating_add(1);
            }
            LifecycleEvent::MissionComplete => self.record_outcome(MissionOutcome::MissionComplete),
            LifecycleEvent::GameOver => self.record_outcome(MissionOutcome::GameOver),
            LifecycleEvent::DoorInteractionRequested { .. }
            | LifecycleEvent::SceneTransitionStarted { .. }
            | LifecycleEvent::MissionCompletePending => {}
        }
    }

    fn enter_scene(&mut self, scene_index: usize, now: f64) {
        self.clear_scene_entities();
        let Some(scene) = self.mission.scene(scene_index).cloned() else {
            warn!(scene_index, "scene_definition_missing");
            return;
        };
        info!(
            scene_index,
            scene_id = %scene.id,
            spawns = scene.spawns.len(),
            power_ups = scene.power_ups.len(),
            "scene_started"
        );
        for spawn in scene.spawns {
            self.spawn_enemy(spawn.kind, spawn.position, spawn.sub_path);
        }
        for placement in scene.power_ups {
            self.spawn_power_up(placement.kind, placement.position);
        }
        self.run.pending_ui.push(UiNotice::SceneTitle(scene.title));
        self.run.scene_path_cursor = 0;
        self.start_next_scene_path(now);
    }

    fn start_next_scene_path(&mut self, now: f64) -> bool {
        let scene_index = self.run.lifecycle.scene_index();
        let Some(path_index) = self
            .mission
            .scene(scene_index)
            .and_then(|scene| scene.path_indices.get(self.run.scene_path_cursor))
            .copied()
        else {
            return false;
        };
        self.run.scene_path_cursor += 1;

        let run = &mut self.run;
        let position = run.camera.position();
        match run.traversal.start(path_index, position, now, &mut run.camera) {
            Ok(()) => {
                self.events.emit(SessionEvent::TraversalStarted { path_index });
                true
            }
            Err(err) => {
                warn!(error = %err, scene_index, path_index, "traversal_unavailable");
                false
            }
        }
    }

    fn spawn_enemy(&mut self, kind: EnemyKind, feet: Vec3, sub_path: Vec<Vec3>) {
        let stats = self.mission.enemy_stats(kind);
        let renderable = self.run.renderables.allocate();
        let enemy_id = self
            .run
            .roster
            .spawn(kind, stats, feet, sub_path, renderable);
        self.run
            .registry
            .register(renderable, HitTarget::Enemy(enemy_id));
        let desc = RenderableDesc {
            kind: self.visual_for(kind),
            debug_name: kind.as_token(),
            position: feet,
        };
        self.collaborators.scene_graph.add(renderable, &desc);
        debug!(enemy_id = enemy_id.0, kind = kind.as_token(), "enemy_spawned");
        self.events
            .emit(SessionEvent::EnemySpawned { enemy_id, kind });
    }

    fn spawn_power_up(&mut self, kind: PowerUpKind, position: Vec3) {
        let renderable = self.run.renderables.allocate();
        let id = self.run.collectibles.spawn(kind, position, renderable);
        self.run
            .registry
            .register(renderable, HitTarget::Collectible(id));
        let desc = RenderableDesc {
            kind: RenderableKind::Placeholder,
            debug_name: kind.as_token(),
            position,
        };
        self.collaborators.scene_graph.add(renderable, &desc);
    }

    fn visual_for(&self, kind: EnemyKind) -> RenderableKind {
        if self.loaded_models.contains(&kind) {
            default_renderable_for_enemy(kind)
        } else {
            RenderableKind::Placeholder
        }
    }

    fn clear_scene_entities(&mut self) {
        for enemy in self.run.roster.entities() {
            self.run.registry.unregister(enemy.renderable);
            if enemy.state() != EnemyState::Removed {
                self.collaborators.scene_graph.remove(enemy.renderable);
            }
        }
        for item in self.run.collectibles.items() {
            if self.run.registry.unregister(item.renderable).is_some() {
                self.collaborators.scene_graph.remove(item.renderable);
            }
        }
        self.run.roster.clear();
        self.run.collectibles.clear();
        self.run.tasks.cancel_enemy_tasks();
    }

    fn record_outcome(&mut self, outcome: MissionOutcome) {
        if self.run.outcome_recorded {
            return;
        }
        self.run.outcome_recorded = true;
        let stats = self.run.resolver.stats();
        let record = LeaderboardRecord {
            mission: self.mission.mission_id().to_string(),
            outcome,
            score: self.run.combo.score(),
            max_streak: self.run.combo.max_streak(),
            shots_fired: stats.shots_fired,
            hits: stats.hits,
            headshot_kills: stats.headshot_kills,
            scenes_cleared: self.run.scenes_cleared,
            accuracy: stats.accuracy(),
        };
        match self.collaborators.leaderboard.record(&record) {
            Ok(()) => info!(
                ?outcome,
                score = record.score,
                max_streak = record.max_streak,
                accuracy = record.accuracy,
                "run_recorded"
            ),
            Err(err) => warn!(error = %err, ?outcome, "leaderboard_write_failed"),
        }
    }
}
