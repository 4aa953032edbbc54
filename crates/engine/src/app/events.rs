use super::combat::ResolvedTarget;
use super::enemy::{EnemyId, EnemyKind};
use super::lifecycle::LifecycleEvent;
use super::power_ups::PowerUpKind;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    EnemySpawned {
        enemy_id: EnemyId,
        kind: EnemyKind,
    },
    ShotFired {
        target: ResolvedTarget,
        headshot: bool,
        damage: i32,
        killed: bool,
    },
    EnemyKilled {
        enemy_id: EnemyId,
        headshot: bool,
        score_awarded: u64,
    },
    EnemyRemoved {
        enemy_id: EnemyId,
    },
    PlayerDamaged {
        enemy_id: EnemyId,
        amount: u32,
        remaining_health: u32,
    },
    DryFire,
    ReloadStarted,
    ReloadCompleted,
    PowerUpCollected {
        kind: PowerUpKind,
    },
    PowerUpExpired {
        kind: PowerUpKind,
    },
    TraversalStarted {
        path_index: usize,
    },
    TraversalCompleted {
        path_index: usize,
    },
    Lifecycle(LifecycleEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEventKind {
    EnemySpawned,
    ShotFired,
    EnemyKilled,
    EnemyRemoved,
    PlayerDamaged,
    DryFire,
    Reload,
    PowerUp,
    Traversal,
    Lifecycle,
}

impl SessionEvent {
    pub fn kind(&self) -> SessionEventKind {
        match self {
            Self::EnemySpawned { .. } => SessionEventKind::EnemySpawned,
            Self::ShotFired { .. } => SessionEventKind::ShotFired,
            Self::EnemyKilled { .. } => SessionEventKind::EnemyKilled,
            Self::EnemyRemoved { .. } => SessionEventKind::EnemyRemoved,
            Self::PlayerDamaged { .. } => SessionEventKind::PlayerDamaged,
            Self::DryFire => SessionEventKind::DryFire,
            Self::ReloadStarted | Self::ReloadCompleted => SessionEventKind::Reload,
            Self::PowerUpCollected { .. } | Self::PowerUpExpired { .. } => {
                SessionEventKind::PowerUp
            }
            Self::TraversalStarted { .. } | Self::TraversalCompleted { .. } => {
                SessionEventKind::Traversal
            }
            Self::Lifecycle(_) => SessionEventKind::Lifecycle,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionEventCounts {
    pub total: u32,
    pub enemies_spawned: u32,
    pub shots_fired: u32,
    pub enemies_killed: u32,
    pub enemies_removed: u32,
    pub player_damaged: u32,
    pub dry_fires: u32,
    pub reload: u32,
    pub power_up: u32,
    pub traversal: u32,
    pub lifecycle: u32,
}

impl SessionEventCounts {
    fn record(&mut self, kind: SessionEventKind) {
        self.total = self.total.saturating_add(1);
        let slot = match kind {
            SessionEventKind::EnemySpawned => &mut self.enemies_spawned,
            SessionEventKind::ShotFired => &mut self.shots_fired,
            SessionEventKind::EnemyKilled => &mut self.enemies_killed,
            SessionEventKind::EnemyRemoved => &mut self.enemies_removed,
            SessionEventKind::PlayerDamaged => &mut self.player_damaged,
            SessionEventKind::DryFire => &mut self.dry_fires,
            SessionEventKind::Reload => &mut self.reload,
            SessionEventKind::PowerUp => &mut self.power_up,
            SessionEventKind::Traversal => &mut self.traversal,
            SessionEventKind::Lifecycle => &mut self.lifecycle,
        };
        *slot = slot.saturating_add(1);
    }
}

#[derive(Debug, Default)]
pub struct SessionEventBus {
    current_tick_events: Vec<SessionEvent>,
    last_tick_events: Vec<SessionEvent>,
    last_tick_counts: SessionEventCounts,
}

impl SessionEventBus {
    pub fn emit(&mut self, event: SessionEvent) {
        self.current_tick_events.push(event);
    }

    pub fn iter_emitted_so_far(&self) -> impl Iterator<Item = &SessionEvent> {
        self.current_tick_events.iter()
    }

    pub fn finish_tick_rollover(&mut self) {
        let mut counts = SessionEventCounts::default();
        for event in &self.current_tick_events {
            counts.record(event.kind());
        }
        self.last_tick_counts = counts;
        self.last_tick_events = std::mem::take(&mut self.current_tick_events);
    }

    pub fn last_tick_events(&self) -> &[SessionEvent] {
        &self.last_tick_events
    }

    pub fn last_tick_counts(&self) -> SessionEventCounts {
        self.last_tick_counts
    }

    pub fn clear(&mut self) {
        self.current_tick_events.clear();
        self.last_tick_events.clear();
        self.last_tick_counts = SessionEventCounts::default();
    }
}
