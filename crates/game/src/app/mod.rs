mod atomic_io;
mod autopilot;
pub(crate) mod bootstrap;
mod leaderboard;
pub(crate) mod loop_runner;
mod presentation;
