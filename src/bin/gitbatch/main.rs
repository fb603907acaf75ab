use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use log::{debug, warn};

use gitbatch::batch::{self, BatchOutcome};
use gitbatch::git::{GitDriver, ProcessRunner, discover_work_dir};
use gitbatch::prefs::Preferences;
use gitbatch::select::Console;

#[derive(Parser, Debug)]
#[command(
    name = "gitbatch",
    version,
    about = "Merge several git branches into a target branch in one go"
)]
struct Cli {
    /// Log file path (debug logging is written here in addition to stderr warnings)
    #[arg(long)]
    log_file: Option<String>,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_file = cli.log_file.as_ref().map(std::fs::File::create).transpose()?;
    gitbatch::logger::init(log_file)?;

    let work_dir = discover_work_dir(&std::env::current_dir()?)?;

    let prefs_path = match Preferences::default_path() {
        Ok(path) => Some(path),
        Err(e) => {
            warn!("Preferences disabled: {e}");
            None
        }
    };

    let mut console = Console::stdio();
    let preferences = match prefs_path.as_deref().and_then(gitbatch::load_preferences) {
        Some(preferences) => {
            writeln!(console, "Preferences loaded.")?;
            preferences
        }
        None => Preferences::default(),
    };

    let mut driver = GitDriver::new(ProcessRunner::new(work_dir));
    match batch::run(&mut driver, &mut console, &preferences)? {
        BatchOutcome::Completed { preferences, .. } => {
            if let Some(path) = &prefs_path {
                gitbatch::save_preferences(&preferences, path);
            }
        }
        BatchOutcome::Aborted(reason) => debug!("Nothing merged: {reason:?}"),
    }

    Ok(ExitCode::SUCCESS)
}
