use dispatch_swarm::config::{env, Config};
use dispatch_swarm::health;
use dispatch_swarm::runtime::{
    build_dispatchers, emit_config_summary, emit_network_status, parse_runtime_args,
    run_status_reporter, wait_for_stop, StopReason,
};
use dispatch_swarm::scheduler::Scheduler;
use dispatch_swarm::signal::SignalProducer;
use dispatch_swarm::target::{register, TargetDescriptor};
use dispatch_swarm::transport::parse_signer;
use std::path::Path;
use std::time::Duration;
use tokio::sync::watch;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let runtime_args = parse_runtime_args()?;

    let dot_env_keys = env::load_dot_env(Path::new(".env"));

    match std::env::var("RUST_LOG") {
        Ok(val) => println!("[STARTUP] RUST_LOG is set to: '{}'", val),
        Err(_) => println!("[STARTUP] RUST_LOG is unset."),
    }
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        println!("[STARTUP] RUST_LOG invalid or unset; defaulting to 'info'");
        tracing_subscriber::EnvFilter::new("info")
    });
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    if dot_env_keys > 0 {
        tracing::info!("[ENV] loaded {} key(s) from .env", dot_env_keys);
    }
    if runtime_args.networks.is_none() {
        env::warn_missing_required();
    }

    let config = Config::load(runtime_args.networks.as_deref())?;
    emit_config_summary(&config);
    if runtime_args.explain_config {
        tracing::info!("[OPS] --explain-config requested; exiting without dispatching.");
        return Ok(());
    }

    let signer = parse_signer(&config.private_key)?;
    tracing::info!("[BOOT] signer {:#x}", signer.address());

    let (target_writer, target_reader) = register(TargetDescriptor::round_trip(
        &config.signal.base_symbol,
        &config.signal.initial_ticker,
        0.0,
    ));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut background = Vec::new();
    if let Some(port) = config.health_port {
        match health::bind(port).await {
            Ok(listener) => {
                background.push(tokio::spawn(health::serve(listener, shutdown_rx.clone())));
            }
            Err(err) => {
                tracing::error!("[HEALTH] failed to bind port {port}: {err}; liveness disabled");
            }
        }
    }

    let dispatchers = build_dispatchers(&config, &signer, &target_reader).await;

    match config.signal.url.clone() {
        Some(url) => {
            let producer = SignalProducer::new(url, &config.signal, target_writer);
            background.push(tokio::spawn(producer.run(shutdown_rx.clone())));
        }
        None => drop(target_writer),
    }
    if let Some(interval) = config.status_interval {
        background.push(tokio::spawn(run_status_reporter(
            dispatchers.clone(),
            interval,
            shutdown_rx.clone(),
        )));
    }

    let scheduler = Scheduler::new(dispatchers.clone());
    let mut scheduler_task = tokio::spawn(scheduler.run(shutdown_rx));

    let reason = wait_for_stop(tokio::signal::ctrl_c(), &mut scheduler_task).await;
    let _ = shutdown_tx.send(true);

    if reason == StopReason::Interrupted {
        if let Err(err) = scheduler_task.await {
            tracing::error!("[SCHED] dispatch loop task failed: {err}");
        }
    }
    for task in background {
        let _ = task.await;
    }

    for dispatcher in &dispatchers {
        let outstanding = dispatcher.drain(DRAIN_TIMEOUT).await;
        if outstanding > 0 {
            tracing::warn!(
                "[FIRE] {}: {} submission(s) still in flight at exit",
                dispatcher.network(),
                outstanding
            );
        }
    }
    emit_network_status(&dispatchers).await;
    tracing::info!("[*] Shutdown complete.");
    Ok(())
}
