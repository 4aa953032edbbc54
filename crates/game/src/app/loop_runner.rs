use std::process::ExitCode;

use rail_engine::run_headless;
use tracing::{error, info};

use super::bootstrap::AppWiring;

pub(crate) fn run(mut app: AppWiring) -> ExitCode {
    match run_headless(&app.config, &mut app.session, &mut app.driver) {
        Ok(summary) => {
            let stats = app.session.shot_stats();
            info!(
                state = summary.final_state.as_str(),
                score = summary.score,
                max_streak = app.session.combo().max_streak,
                accuracy = stats.accuracy(),
                headshot_kills = stats.headshot_kills,
                scenes_cleared = app.session.scenes_cleared(),
                timed_out = summary.timed_out,
                "run_finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "run_failed");
            ExitCode::FAILURE
        }
    }
}
