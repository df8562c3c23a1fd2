mod logging;
mod replay;
mod scenario;
#[cfg(test)]
mod tests;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use logging::Logger;

#[derive(Debug, Parser)]
#[command(name = "connman_replay")]
#[command(about = "Replay a timestamped Wi-Fi event script through the connection core")]
struct Cli {
    /// TOML script with profiles, policy overrides and steps.
    script: PathBuf,
    /// Append JSON lines describing every action to this file.
    #[arg(long = "json-log")]
    json_log: Option<PathBuf>,
    /// Fail unless the link ends in this state (e.g. COMPLETED).
    #[arg(long = "expect-state")]
    expect_state: Option<String>,
    #[arg(short, long)]
    quiet: bool,
    /// Library log verbosity on stderr; repeat for more.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::install(cli.verbose);
    let mut logger = Logger::new(cli.json_log.clone(), cli.quiet)?;

    let script = scenario::load_script(&cli.script)?;
    let outcome = replay::run_script(&script, &mut logger)?;

    if let Some(expected) = &cli.expect_state {
        let actual = outcome.final_state.as_str();
        if !actual.eq_ignore_ascii_case(expected) {
            logger.warn(format!("expected final state {expected}, got {actual}"));
            bail!("final state mismatch: expected {expected}, got {actual}");
        }
    }
    Ok(())
}
