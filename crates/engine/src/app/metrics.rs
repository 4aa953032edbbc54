use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

use super::session::GameSession;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EncounterGauges {
    pub live_enemies: usize,
    pub score: u64,
    pub combo_streak: u32,
    pub accuracy: f32,
}

impl EncounterGauges {
    pub fn of(session: &GameSession) -> Self {
        Self {
            live_enemies: session.roster_counts().live() as usize,
            score: session.score(),
            combo_streak: session.combo().streak,
            accuracy: session.shot_stats().accuracy(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub simulated_seconds: f64,
    /// Ticks per simulated second over the last interval.
    pub tps: f32,
    /// Simulated seconds advanced per wall-clock second.
    pub speedup: f32,
    pub kills: u32,
    pub gauges: EncounterGauges,
}

#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    latest: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        *self.latest.read().unwrap_or_else(|poisoned| {
            warn!("metrics_lock_poisoned");
            poisoned.into_inner()
        })
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        let mut guard = self
            .latest
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = snapshot;
    }
}

/// Counts ticks and kills between snapshots; the interval is measured in
/// simulated seconds so headless runs report at the same cadence as paced ones.
#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_seconds: f64,
    sim_start: f64,
    wall_start: Instant,
    ticks: u32,
    kills: u32,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration, sim_now: f64, wall_now: Instant) -> Self {
        Self {
            interval_seconds: interval.as_secs_f64(),
            sim_start: sim_now,
            wall_start: wall_now,
            ticks: 0,
            kills: 0,
        }
    }

    pub(crate) fn record_tick(&mut self, kills: u32) {
        self.ticks = self.ticks.saturating_add(1);
        self.kills = self.kills.saturating_add(kills);
    }

    pub(crate) fn maybe_snapshot(
        &mut self,
        sim_now: f64,
        wall_now: Instant,
        gauges: EncounterGauges,
    ) -> Option<LoopMetricsSnapshot> {
        let sim_elapsed = sim_now - self.sim_start;
        if sim_elapsed < self.interval_seconds {
            return None;
        }

        let wall_elapsed = wall_now
            .saturating_duration_since(self.wall_start)
            .as_secs_f64()
            .max(f64::EPSILON);
        let snapshot = LoopMetricsSnapshot {
            simulated_seconds: sim_now,
            tps: (f64::from(self.ticks) / sim_elapsed) as f32,
            speedup: (sim_elapsed / wall_elapsed) as f32,
            kills: self.kills,
            gauges,
        };

        self.sim_start = sim_now;
        self.wall_start = wall_now;
        self.ticks = 0;
        self.kills = 0;
        Some(snapshot)
    }
}
