use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

use crate::content::MissionLoadError;
use crate::StartupError;

use super::clock::{FixedStepClock, FrameClock, SimClock, WallClock};
use super::lifecycle::{LifecycleError, LifecycleState};
use super::metrics::{EncounterGauges, MetricsAccumulator};
use super::session::GameSession;
use super::MetricsHandle;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub max_sim_duration: Option<Duration>,
    pub realtime: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            max_sim_duration: Some(Duration::from_secs(600)),
            realtime: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to load mission: {0}")]
    MissionLoad(#[from] MissionLoadError),
    #[error("mission could not begin: {0}")]
    Lifecycle(#[from] LifecycleError),
}

pub trait InputDriver {
    fn drive(&mut self, session: &mut GameSession, now: f64);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoInput;

impl InputDriver for NoInput {
    fn drive(&mut self, _session: &mut GameSession, _now: f64) {}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub simulated_seconds: f64,
    pub final_state: LifecycleState,
    pub score: u64,
    pub timed_out: bool,
}

pub fn run_headless(
    config: &LoopConfig,
    session: &mut GameSession,
    driver: &mut dyn InputDriver,
) -> Result<RunSummary, AppError> {
    run_headless_with_metrics(config, session, driver, MetricsHandle::default())
}

pub fn run_headless_with_metrics(
    config: &LoopConfig,
    session: &mut GameSession,
    driver: &mut dyn InputDriver,
    metrics_handle: MetricsHandle,
) -> Result<RunSummary, AppError> {
    let fixed_dt = Duration::from_secs_f64(1.0 / f64::from(config.target_tps.max(1)));
    if config.realtime {
        run_with_frame_clock(config, session, driver, metrics_handle, &mut WallClock::new())
    } else {
        let mut clock = FixedStepClock::new(fixed_dt);
        run_with_frame_clock(config, session, driver, metrics_handle, &mut clock)
    }
}

pub fn run_with_frame_clock(
    config: &LoopConfig,
    session: &mut GameSession,
    driver: &mut dyn InputDriver,
    metrics_handle: MetricsHandle,
    frame_clock: &mut dyn FrameClock,
) -> Result<RunSummary, AppError> {
    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();
    let max_sim_seconds = config.max_sim_duration.map(|cap| cap.as_secs_f64());

    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        realtime = config.realtime,
        "loop_config"
    );

    let mut clock = SimClock::new(fixed_dt);
    session.begin(clock.now())?;
    info!(
        mission = session.mission().mission_id(),
        total_scenes = session.total_scenes(),
        "mission_started"
    );

    let mut accumulator = Duration::ZERO;
    let mut metrics_accumulator =
        MetricsAccumulator::new(metrics_log_interval, clock.now(), Instant::now());
    let mut timed_out = false;

    while !session.lifecycle_state().is_terminal() {
        let frame_start = Instant::now();
        let raw_frame_dt = frame_clock.frame_delta();

        accumulator = accumulator.saturating_add(clamp_frame_delta(raw_frame_dt, max_frame_delta));
        let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
        for _ in 0..step_plan.ticks_to_run {
            clock.step();
            let now = clock.now();
            driver.drive(session, now);
            session.tick(now, fixed_dt_seconds);
            metrics_accumulator.record_tick(session.last_tick_counts().enemies_killed);
            if session.lifecycle_state().is_terminal() {
                break;
            }
        }
        accumulator = step_plan.remaining_accumulator;

        if step_plan.dropped_backlog > Duration::ZERO {
            warn!(
                dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame, "sim_clamp_triggered"
            );
        }

        if let Some(snapshot) = metrics_accumulator.maybe_snapshot(
            clock.now(),
            Instant::now(),
            EncounterGauges::of(session),
        ) {
            metrics_handle.publish(snapshot);
            info!(
                simulated_seconds = snapshot.simulated_seconds,
                tps = snapshot.tps,
                speedup = snapshot.speedup,
                kills = snapshot.kills,
                live_enemies = snapshot.gauges.live_enemies,
                score = snapshot.gauges.score,
                combo = snapshot.gauges.combo_streak,
                accuracy = snapshot.gauges.accuracy,
                state = session.lifecycle_state().as_str(),
                "loop_metrics"
            );
        }

        if max_sim_seconds.is_some_and(|cap| clock.now() >= cap) {
            timed_out = true;
            warn!(
                simulated_seconds = clock.now(),
                state = session.lifecycle_state().as_str(),
                "sim_duration_cap_reached"
            );
            break;
        }

        if config.realtime {
            let elapsed = Instant::now().saturating_duration_since(frame_start);
            let pause = compute_frame_sleep(elapsed, fixed_dt);
            if pause > Duration::ZERO {
                thread::sleep(pause);
            }
        }
    }

    let summary = RunSummary {
        ticks: clock.steps(),
        simulated_seconds: clock.now(),
        final_state: session.lifecycle_state(),
        score: session.score(),
        timed_out,
    };
    info!(
        ticks = summary.ticks,
        simulated_seconds = summary.simulated_seconds,
        state = summary.final_state.as_str(),
        score = summary.score,
        "shutdown"
    );
    Ok(summary)
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn compute_frame_sleep(elapsed: Duration, target: Duration) -> Duration {
    target.saturating_sub(elapsed)
}
