mod cli;

use std::path::Path;
use std::process;
use std::time::Instant;

use clap::Parser;
use cli::Args;
use cohort_summary::error::Result;
use cohort_summary::{render, summarize_input, CohortError, Config};
use env_logger::{Builder, Env};
use log::{debug, info};
use sysinfo::{get_current_pid, ProcessExt, System, SystemExt};

/// Resident memory of this process in bytes, 0 when unavailable.
fn monitor_memory() -> u64 {
    let Ok(pid) = get_current_pid() else {
        return 0;
    };
    let mut sys = System::new();
    if !sys.refresh_process(pid) {
        return 0;
    }
    sys.process(pid).map_or(0, |p| p.memory())
}

fn init_logging(args: &Args) {
    let env = Env::new().filter("COHORT_LOG");
    Builder::new()
        .filter(Some("cohort_summary"), args.log_level())
        .format_timestamp(None)
        .parse_env(env)
        .init();
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match args.config {
        Some(ref path) => {
            info!("Loading config from {}", path.display());
            Config::load(path)?
        }
        None => Config::default(),
    };
    args.merge_into(&mut config);
    config.validate()?;
    Ok(config)
}

fn run(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    debug!("Config {:#?}", config);

    let summary = summarize_input(&args.input, args.columnar.as_deref(), &config)?;

    let output = render(&summary, args.format)?;
    write_output(args.output.as_deref(), &output)
}

fn write_output(path: Option<&Path>, output: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, output).map_err(|source| CohortError::Output {
                path: path.to_path_buf(),
                source,
            })?;
            info!("Report written to {}", path.display());
        }
        None => print!("{}", output),
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(&args);
    debug!("Arguments {:#?}", args);

    let start_time = Instant::now();
    let start_memory = monitor_memory();

    let result = run(&args);

    let end_memory = monitor_memory();
    debug!("Time elapsed: {:?}", start_time.elapsed());
    debug!("Memory used: {} bytes", end_memory.saturating_sub(start_memory));

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
