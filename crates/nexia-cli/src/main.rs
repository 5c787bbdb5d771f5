use std::path::Path;
use std::path::PathBuf;

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use nexia_console::application::cli;
use nexia_console::Config;
use nexia_console::Console;
use nexia_console::ExecutionOutcome;
use nexia_console::NexiaApi;
use nexia_console::RuntimeManager;
use tokio::sync::mpsc;
use tokio::task::LocalSet;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod headless;
mod interactive;
mod submission;

use submission::SubmissionRecorder;

/// Sends JSON logs to a file so they never mix with the console's own output.
fn init_logging(matches: &ArgMatches) -> Result<WorkerGuard> {
    let level = matches
        .get_one::<String>(cli::ARG_LOG_LEVEL)
        .map(String::as_str)
        .unwrap_or("info");
    let log_file = PathBuf::from(
        matches
            .get_one::<String>(cli::ARG_LOG_FILE)
            .map(String::as_str)
            .unwrap_or("nexia.log"),
    );

    let dir = log_file
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let Some(file_name) = log_file.file_name() else {
        bail!("--log-file must name a file: {}", log_file.display());
    };

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow!("failed to install the logger: {err}"))?;

    return Ok(guard);
}

struct RunOptions {
    source_path: PathBuf,
    headless: bool,
    exercise: Option<String>,
}

/// Drives one console session. Returns whether the last run succeeded.
async fn run(options: RunOptions) -> Result<bool> {
    let loader = RuntimeManager::from_config()?;
    let recorder = match &options.exercise {
        Some(exercise_id) => Some(SubmissionRecorder::new(
            NexiaApi::from_config()?,
            exercise_id,
            options.source_path.clone(),
        )),
        None => None,
    };

    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<ExecutionOutcome>();
    let mut console = Console::new().with_outcome_observer(outcome_tx);
    console.mount(loader);

    let observer = tokio::task::spawn_local(async move {
        let mut last_success = false;
        let mut submissions = vec![];
        while let Some(outcome) = outcome_rx.recv().await {
            last_success = outcome.success;
            if let Some(recorder) = &recorder {
                submissions.push(recorder.record(&outcome).await);
            }
        }
        return (last_success, submissions);
    });

    if options.headless {
        headless::run(&mut console, &options.source_path).await?;
    } else {
        interactive::run(&mut console, options.source_path.clone()).await?;
    }

    // Closes the outcome channel so the observer can finish.
    drop(console);
    let (last_success, submissions) = observer.await?;

    for submission in submissions {
        match submission {
            Ok(Some(res)) => println!(
                "📤 Submission recorded: {}",
                res.message.unwrap_or_else(|| "ok".to_string())
            ),
            Ok(None) => {}
            Err(err) => eprintln!("❌ Submission failed: {err}"),
        }
    }

    return Ok(last_success);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let matches = cli::build().get_matches();
    let guard = init_logging(&matches)?;

    match matches.subcommand() {
        Some(("config", sub_matches)) => {
            if let Some(("default", _)) = sub_matches.subcommand() {
                println!("{}", Config::serialize_default(cli::build()));
            }
        }
        Some(("run", sub_matches)) => {
            Config::load(cli::build(), vec![&matches, sub_matches]).await?;

            let Some(file) = sub_matches.get_one::<String>(cli::ARG_FILE) else {
                bail!("a source file is required");
            };
            let options = RunOptions {
                source_path: PathBuf::from(file),
                headless: sub_matches.get_flag(cli::ARG_HEADLESS),
                exercise: sub_matches.get_one::<String>(cli::ARG_EXERCISE).cloned(),
            };

            let success = LocalSet::new().run_until(run(options)).await?;
            if !success {
                // Flush buffered logs, exit skips destructors.
                drop(guard);
                std::process::exit(1);
            }
        }
        _ => {}
    }

    return Ok(());
}
