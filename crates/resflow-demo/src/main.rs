//! Runs the built-in flight scenario with a console display.
//!
//! Logs go to stderr; set `RUST_LOG=debug` to see every event.

use std::io::Write;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use env_logger::{Builder, Env};
use resflow_core::manager::TerminationReason;
use resflow_demo::display::{Throttle, render};
use resflow_demo::{FLIGHT_SCENARIO, ScenarioError, build_manager, load_scenario};

fn main() -> ExitCode {
    Builder::from_env(Env::default().default_filter_or("info")).init();

    match run() {
        Ok(reason) => {
            println!("Simulation ended: {reason}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<TerminationReason, ScenarioError> {
    let data = load_scenario(FLIGHT_SCENARIO)?;
    let mut manager = build_manager(&data)?;
    let mut throttle = Throttle::new(Duration::from_secs(1));

    let report = manager.run(|snapshot| {
        if throttle.ready(Instant::now()) {
            let mut stdout = std::io::stdout().lock();
            // A failed redraw is not worth stopping the flight for.
            let _ = write!(stdout, "{}", render(snapshot));
            let _ = stdout.flush();
        }
    })?;

    print!("{}", render(&manager.snapshot()));
    log::info!(
        "{} manager cycles, {} system cycles, {} events",
        report.cycles,
        report.system_cycles,
        report.events_processed
    );
    Ok(report.reason)
}
