use std::io::IsTerminal;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use backdrop::{
    execute_guarded, Completion, FileResources, Job, MemoryResources, MemorySurface,
    RenderedSurface, ResourceStore, StylesheetSurface, SyncAgent,
};
use companion::{CompanionClient, CompanionConfig};
use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};
use scheduler::Scheduler;
use surfconfig::SurfConfig;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::bootstrap::{ensure_directory, Settings};
use crate::cli::RunArgs;
use crate::paths::AppPaths;
use crate::style;

pub const BACKGROUND_STYLESHEET: &str = "background.css";
pub const SPOOL_DIR: &str = "spool";

/// Upper bound on a single wait when no task is scheduled.
const IDLE_WAIT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    Poll,
    Status,
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stdout().is_terminal())
        .init();
}

pub fn run(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let settings = Settings::resolve(&args, &paths)?;
    let config = &settings.config;
    debug!(
        config = %paths.config_dir().display(),
        data = %paths.data_dir().display(),
        source = ?settings.source,
        output = %settings.output_dir.display(),
        "resolved glasssurf paths"
    );

    let companion = CompanionConfig::new(&config.host, config.port, config.request_timeout)
        .context("invalid companion address")?;
    let client = CompanionClient::new(companion).context("failed to construct companion client")?;
    info!(
        state = %client.state_url(),
        image = %client.image_url(),
        interval = ?config.poll_interval,
        "watching companion for background changes"
    );

    let limit = args.tick_limit();
    if args.dry_run {
        info!("dry run: backgrounds are kept in memory and nothing is written");
        let agent = SyncAgent::new(MemorySurface::new(), MemoryResources::new());
        return drive(agent, &client, config, limit);
    }

    ensure_directory(&settings.output_dir)?;
    if config.surface.styles {
        style::apply_overrides(&settings.output_dir)?;
    }

    let mut surface = StylesheetSurface::new(settings.output_dir.join(BACKGROUND_STYLESHEET));
    // A previous run may have left the stylesheet pointing at a spooled file
    // that is about to be swept.
    surface
        .clear_background()
        .context("failed to reset background stylesheet")?;
    let resources = FileResources::open(settings.output_dir.join(SPOOL_DIR))
        .context("failed to open background spool")?;
    let swept = resources
        .sweep()
        .context("failed to clear orphaned backgrounds")?;
    if swept > 0 {
        info!(count = swept, "removed backgrounds left by a previous run");
    }
    debug!(spool = %resources.dir().display(), "background spool ready");

    drive(SyncAgent::new(surface, resources), &client, config, limit)
}

/// Event loop: fires scheduled tasks, hands jobs to worker threads and feeds
/// their completions back to the agent one at a time.
fn drive<S, R>(
    mut agent: SyncAgent<S, R>,
    client: &CompanionClient,
    config: &SurfConfig,
    limit: Option<u64>,
) -> Result<()>
where
    S: RenderedSurface,
    R: ResourceStore,
{
    let (tx, rx) = unbounded::<Completion>();
    let mut scheduler = Scheduler::new();
    let start = Instant::now();
    let poll_task = scheduler.every(Task::Poll, config.poll_interval, start)?;
    if config.status_enabled() {
        scheduler.every(
            Task::Status,
            config.status_interval,
            start + config.status_interval,
        )?;
    }

    let mut ticks = 0u64;
    let mut polling = true;
    loop {
        for fired in scheduler.tick(Instant::now()) {
            match fired.kind {
                Task::Poll => {
                    if fired.missed > 0 {
                        debug!(missed = fired.missed, "poll ticks coalesced");
                    }
                    ticks += 1;
                    spawn_job(client, &tx, agent.poll_tick())?;
                    if limit.is_some_and(|limit| ticks >= limit) {
                        scheduler.cancel(poll_task)?;
                        polling = false;
                        debug!(ticks, in_flight = agent.in_flight(), "tick limit reached; draining");
                    }
                }
                Task::Status => report_status(&mut agent),
            }
        }

        if !polling && agent.is_quiescent() {
            break;
        }

        let wait = scheduler
            .time_until_next(Instant::now())
            .unwrap_or(IDLE_WAIT);
        match rx.recv_timeout(wait) {
            Ok(completion) => {
                for job in agent.handle(completion) {
                    spawn_job(client, &tx, job)?;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => bail!("worker channel closed unexpectedly"),
        }
    }

    report_status(&mut agent);
    agent
        .shutdown()
        .context("failed to release the displayed background")?;
    info!(ticks, "glasssurf stopped");
    Ok(())
}

fn spawn_job(client: &CompanionClient, tx: &Sender<Completion>, job: Job) -> Result<()> {
    let label = job.label();
    let client = client.clone();
    let tx = tx.clone();
    thread::Builder::new()
        .name(format!("glasssurf-{label}"))
        .spawn(move || {
            let completion = execute_guarded(&client, job);
            // The loop may have exited already; the result is then moot.
            let _ = tx.send(completion);
        })
        .with_context(|| format!("failed to spawn {label} worker"))?;
    Ok(())
}

fn report_status<S, R>(agent: &mut SyncAgent<S, R>)
where
    S: RenderedSurface,
    R: ResourceStore,
{
    let stats = agent.take_stats();
    info!(
        %stats,
        reachable = ?agent.poller().reachable(),
        current = agent.updater().current_url().unwrap_or("none"),
        in_flight = agent.in_flight(),
        "status"
    );
}
