//! Solar Rush entry point: CLI wiring and config-driven session construction.

use std::process;

use tracing_subscriber::EnvFilter;

use solar_rush::cli::{self, CliOptions};
use solar_rush::config::ScenarioConfig;
use solar_rush::io::export::{export_csv, export_report_json};
use solar_rush::sim::controller::{GreedyOperator, IdleOperator, Operator};
use solar_rush::sim::engine::Session;
use solar_rush::sim::kpi::SessionReport;
use solar_rush::sim::notify::LogNotifier;
use solar_rush::sim::types::TickRecord;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the scenario: `--scenario` takes priority, then `--preset`, then baseline.
fn load_scenario(opts: &CliOptions) -> ScenarioConfig {
    let loaded = if let Some(ref path) = opts.scenario {
        ScenarioConfig::from_toml_file(path)
    } else if let Some(ref name) = opts.preset {
        ScenarioConfig::from_preset(name)
    } else {
        Ok(ScenarioConfig::baseline())
    };
    match loaded {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    }
}

/// Runs one session with the given operator and returns its records and report.
fn run_session<O: Operator>(cfg: &ScenarioConfig, operator: O) -> (Vec<TickRecord>, SessionReport) {
    let mut session = Session::new(
        cfg.to_session_config(),
        cfg.build_ledger(),
        cfg.build_sources(),
        cfg.build_repairer(),
        operator,
        LogNotifier,
    );
    let records = session.run();
    let report = SessionReport::from_records(
        &records,
        session.outcome(),
        session.collector().collected(),
        session.repairer().completed(),
    );
    (records, report)
}

fn main() {
    let opts = match cli::parse_args() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_usage();
            process::exit(1);
        }
    };
    if opts.help {
        cli::print_usage();
        return;
    }

    init_logging();

    let mut scenario = load_scenario(&opts);
    if let Some(seed) = opts.seed {
        scenario.session.seed = seed;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let (records, report) = if scenario.session.controller == "idle" {
        run_session(&scenario, IdleOperator)
    } else {
        run_session(&scenario, GreedyOperator::default())
    };

    for r in &records {
        println!("{r}");
    }
    println!("\n{report}");

    if let Some(ref path) = opts.telemetry_out {
        if let Err(e) = export_csv(&records, path) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Telemetry written to {}", path.display());
    }

    if let Some(ref path) = opts.report_out {
        if let Err(e) = export_report_json(&report, path) {
            eprintln!("error: failed to write report: {e}");
            process::exit(1);
        }
        eprintln!("Report written to {}", path.display());
    }
}
