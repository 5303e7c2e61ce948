use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use timeturner::calendar;
use timeturner::cli::{Cli, Command, PutArgs, ReportArgs, ServeArgs};
use timeturner::clock::{Clock, SystemClock};
use timeturner::config::{Config, ConfigError};
use timeturner::pages::{DaysPage, HostsPage, InstantsPage, Page, SnapshotPage};
use timeturner::report;
use timeturner::service::SnapshotService;
use timeturner::web::{self, AppState};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_service(config: &Config) -> Result<SnapshotService, ConfigError> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let repository = config.open_repository(clock)?;
    Ok(SnapshotService::new(Arc::new(repository)))
}

fn serve(args: &ServeArgs) -> anyhow::Result<()> {
    let config = Config::from_serve_args(args)?;
    tracing::info!(
        database = ?config.database,
        retention = ?config.retention,
        "opening snapshot store"
    );
    let service = open_service(&config)?;

    let state = Arc::new(AppState::new(service));
    let router = web::create_router(state, config.max_body_bytes);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime
        .block_on(web::serve(config.listen, router))
        .with_context(|| format!("failed to serve on {}", config.listen))
}

fn report(args: &ReportArgs) -> anyhow::Result<()> {
    let config = Config::load(&args.store)?;
    let service = open_service(&config)?;

    let page = match (&args.date, &args.time, &args.host, &args.title) {
        (None, _, _, _) => Page::Days(DaysPage::new(&service.list_days()?)),
        (Some(date), None, _, _) => {
            let day = calendar::parse_day(date)?;
            Page::Instants(InstantsPage::new(day, &service.list_instants(day)?))
        }
        (Some(date), Some(time), Some(host), Some(title)) => {
            let timestamp = calendar::parse_instant(date, time)?;
            let Some(view) =
                service.view(timestamp, host, title, args.sort.as_deref(), args.reverse)?
            else {
                bail!("No such snapshot found");
            };
            Page::Snapshot(SnapshotPage::new(view, args.reverse))
        }
        (Some(date), Some(time), _, _) => {
            let timestamp = calendar::parse_instant(date, time)?;
            Page::Hosts(HostsPage::new(timestamp, service.list_hosts(timestamp)?))
        }
    };

    print!("{}", report::render(&page, args.json));
    Ok(())
}

fn put(args: &PutArgs) -> anyhow::Result<()> {
    let config = Config::load(&args.store)?;
    let timestamp = calendar::parse_instant(&args.date, &args.time)?;

    let body = match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .context("failed to read stdin")?;
            body
        }
    };

    let service = open_service(&config)?;
    let outcome = service.submit(timestamp, &args.host, &args.title, &body)?;
    println!("{} snapshot #{}", outcome.as_str(), outcome.id());
    Ok(())
}

/// 2 when the caller sent something unusable, 1 for everything else.
fn exit_code(err: &anyhow::Error) -> ExitCode {
    let client_error = err.chain().any(|cause| {
        cause
            .downcast_ref::<timeturner::Error>()
            .is_some_and(timeturner::Error::is_client_error)
    });
    if client_error {
        ExitCode::from(2)
    } else {
        ExitCode::FAILURE
    }
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = match &cli.command {
        Command::Serve(args) => serve(args),
        Command::Report(args) => report(args),
        Command::Put(args) => put(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            exit_code(&err)
        }
    }
}
