mod camera;
mod clock;
mod collaborators;
mod combat;
mod combo;
mod enemy;
mod events;
mod lifecycle;
mod loop_runner;
mod metrics;
mod player;
mod power_ups;
mod session;
mod spawn_scheduler;
mod spline;
mod tasks;
mod traversal;

pub use camera::{CameraPose, CameraRig, CameraWriteError, CameraWriter, DEFAULT_CAMERA_HEIGHT};
pub use clock::{FixedStepClock, FrameClock, SimClock, WallClock};
pub use collaborators::{
    default_renderable_for_enemy, Collaborators, HudSnapshot, LeaderboardRecord,
    LeaderboardStore, MissionOutcome, NullLeaderboard, NullSceneGraph, NullUi, RenderableDesc,
    RenderableId, RenderableIdAllocator, RenderableKind, SceneGraph, UiSink,
};
pub use combat::{
    shot_damage, AnalyticHitTester, CombatContext, CombatEvent, CombatResolver, HitRegistry,
    HitShape, HitTarget, HitTester, HitVolume, Ray, RayHit, ResolvedTarget, ShotStats,
    BASE_SHOT_DAMAGE, DOUBLE_DAMAGE_MULTIPLIER, HEADSHOT_MULTIPLIER, MAX_SHOT_DISTANCE,
};
pub use combo::{
    ComboScoringLedger, ComboSnapshot, COMBO_BONUS_MIN_STREAK, COMBO_BONUS_PER_KILL,
    COMBO_DECAY_SECONDS,
};
pub use enemy::{
    proximity_multiplier, AiContext, DamageOutcome, EnemyAttack, EnemyEntity, EnemyId,
    EnemyIdAllocator, EnemyKind, EnemyRoster, EnemyState, EnemyStats, EnemyVisual, RosterCounts,
    ATTACK_RANGE, DEATH_ANIMATION_SECONDS, SLOW_MOTION_FACTOR,
};
pub use events::{SessionEvent, SessionEventBus, SessionEventCounts, SessionEventKind};
pub use lifecycle::{
    LifecycleError, LifecycleEvent, LifecycleState, SceneLifecycleCoordinator,
    MISSION_COMPLETE_DELAY_SECONDS, SCENE_TRANSITION_SECONDS,
};
pub use loop_runner::{
    run_headless, run_headless_with_metrics, run_with_frame_clock, AppError, InputDriver,
    LoopConfig, NoInput, RunSummary,
};
pub use metrics::{EncounterGauges, LoopMetricsSnapshot, MetricsHandle};
pub use player::PlayerState;
pub use power_ups::{Collectible, CollectibleId, CollectibleSet, ModifierState, PowerUpKind};
pub use session::{GameSession, PlayerAction, SessionConfig, SystemId, GROUND_HEIGHT, SYSTEM_ORDER};
pub use spawn_scheduler::{EncounterSpawnScheduler, SpawnListener, SpawnRequest};
pub use spline::{cubic_ease_in_out, quadratic_ease_in_out, CatmullRomCurve, CurveError};
pub use tasks::{DeferredTask, DeferredTaskQueue, TaskKind, TaskOwner};
pub use traversal::{
    PathTraversalController, TraversalStartError, TraversalState, TraversalTick,
};
