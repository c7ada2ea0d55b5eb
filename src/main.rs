use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;

use copyright_waiver::config::Cli;
use copyright_waiver::models::RunStatus;
use copyright_waiver::services::{spawn_interrupt_watcher, CancellationToken, RunReport};

const EXIT_FATAL: u8 = 1;
const EXIT_REPO_FAILURES: u8 = 2;
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(EXIT_FATAL);
        }
    };

    copyright_waiver::init_tracing(cli.verbose);

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(EXIT_FATAL);
        }
    };

    let cancel = CancellationToken::new();
    let watcher = spawn_interrupt_watcher(cancel.clone());
    let result = copyright_waiver::run(config, cancel).await;
    watcher.abort();

    match result {
        Ok(RunReport::NothingToDo) => {
            println!("No repos to update under the given username.");
            ExitCode::SUCCESS
        }
        Ok(RunReport::DryRun(eligible)) => {
            for record in eligible {
                println!("{} ({})", record.name, record.license_key().unwrap_or("no license"));
            }
            ExitCode::SUCCESS
        }
        Ok(RunReport::Completed(summary)) => {
            print!("{}", summary);
            match summary.status() {
                RunStatus::Success => ExitCode::SUCCESS,
                RunStatus::PartialFailure | RunStatus::Failure => {
                    ExitCode::from(EXIT_REPO_FAILURES)
                }
                RunStatus::Interrupted => ExitCode::from(EXIT_INTERRUPTED),
            }
        }
        Err(e) => {
            tracing::error!(code = e.code(), "Run aborted: {}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}
