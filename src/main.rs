use std::{fs, path::Path, process::ExitCode, time::Duration};

use meeting_scheduler::{
    backend::SlotBackend,
    configuration::Configuration,
    configuration_handler::{Command, ConfigurationHandler},
    database_interface::DatabaseInterface,
    local_slots::LocalSlots,
    requests::{AvailabilityRequest, BookingRequest},
    Scheduler, SchedulerError,
};
use serde::{de::DeserializeOwned, Serialize};
use tokio::time::sleep;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const CONNECTION_ATTEMPTS: u32 = 10;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let configuration = ConfigurationHandler::parse_arguments();

    if let Some(database_url) = configuration.database_url() {
        let mut attempt = 1;
        let backend = loop {
            match DatabaseInterface::new(&database_url) {
                Ok(backend) => {
                    info!("Successfully connected to database");
                    break backend;
                }
                Err(err) if attempt < CONNECTION_ATTEMPTS => {
                    error!(
                        ?err,
                        attempt,
                        "Failed to establish database connection. Retry in 1 sec."
                    );
                    attempt += 1;
                    sleep(Duration::from_secs(1)).await;
                }
                Err(err) => return report(SchedulerError::from(err)),
            }
        };
        run(backend, configuration).await
    } else if let Some(store_file) = configuration.store_file() {
        match LocalSlots::open(store_file) {
            Ok(backend) => run(backend, configuration).await,
            Err(err) => report(SchedulerError::from(err)),
        }
    } else {
        warn!("Neither database nor store file configured, slots are not persisted");
        run(LocalSlots::default(), configuration).await
    }
}

async fn run<T: SlotBackend>(backend: T, configuration: ConfigurationHandler) -> ExitCode {
    let command = configuration.command.clone();
    let scheduler = Scheduler::new(backend, configuration);

    // store calls block on I/O
    let outcome = tokio::task::spawn_blocking(move || execute(&scheduler, command)).await;
    match outcome {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(err)) => report(err),
        Err(err) => report(SchedulerError::Internal(format!("command task failed: {err}"))),
    }
}

fn execute<T: SlotBackend>(
    scheduler: &Scheduler<T, ConfigurationHandler>,
    command: Command,
) -> Result<(), SchedulerError> {
    match command {
        Command::Submit { file } => {
            let request: AvailabilityRequest = read_json(&file)?;
            print_json(&scheduler.submit_availability(&request.availabilities)?)
        }
        Command::Book { file } => {
            let request: BookingRequest = read_json(&file)?;
            print_json(&scheduler.book(&request)?)
        }
        Command::Cancel { display_id } => print_json(&scheduler.cancel(&display_id)?),
        Command::List { view } => print_json(&scheduler.slots(view)?),
    }
}

fn read_json<R: DeserializeOwned>(path: &Path) -> Result<R, SchedulerError> {
    let contents = fs::read_to_string(path).map_err(|err| {
        SchedulerError::Validation(format!("failed to read {}: {err}", path.display()))
    })?;
    serde_json::from_str(&contents).map_err(|err| {
        SchedulerError::Validation(format!(
            "{} is not a valid JSON request: {err}",
            path.display()
        ))
    })
}

fn print_json<V: Serialize>(value: &V) -> Result<(), SchedulerError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|err| SchedulerError::Internal(format!("failed to serialize output: {err}")))?;
    println!("{json}");
    Ok(())
}

fn report(err: SchedulerError) -> ExitCode {
    if err.is_client_error() {
        warn!(%err, "Request rejected");
        eprintln!("{}", err.client_message());
        ExitCode::from(1)
    } else {
        error!(?err, "Request failed");
        eprintln!("{}", err.client_message());
        ExitCode::from(2)
    }
}
