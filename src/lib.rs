// src/lib.rs

pub mod cli;
pub mod command;
pub mod config;
pub mod errors;
pub mod hooks;
pub mod logging;
pub mod process;
pub mod service;
pub mod types;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::command::CommandBuilder;
use crate::config::{default_config_path, load_and_validate, ServiceInfo, Settings};
use crate::hooks::SmtpMailer;
use crate::process::SystemProcessManager;
use crate::service::{Service, ServiceEvent, ServiceRuntime};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - process manager, command builder and mailer
/// - the service and its runtime
/// - Ctrl-C / SIGTERM handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    info!(path = %config_path.display(), "loading configuration");
    let (settings, info) = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&settings, &info);
        return Ok(());
    }

    let manager = Arc::new(SystemProcessManager::new());
    let builder = CommandBuilder::new(manager);
    let (service, events_rx) = Service::new(info, settings, builder, Arc::new(SmtpMailer))?;

    spawn_shutdown_listener(service.events());

    service.start()?;

    let runtime = ServiceRuntime::new(service, events_rx);
    runtime.run().await?;
    Ok(())
}

/// Turn Ctrl-C (and SIGTERM on unix) into a graceful shutdown request.
fn spawn_shutdown_listener(tx: mpsc::UnboundedSender<ServiceEvent>) {
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        if tx.send(ServiceEvent::ShutdownRequested).is_err() {
            debug!("runtime already gone; ignoring shutdown signal");
        }
    });
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            warn!(error = %e, "failed to listen for SIGTERM");
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
            }
            return;
        }
    };

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                warn!(error = %e, "failed to listen for Ctrl+C");
            }
        }
        _ = term.recv() => {
            debug!("SIGTERM received");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
    }
}

/// Simple dry-run output: print the service, its command and hooks.
fn print_dry_run(settings: &Settings, info: &ServiceInfo) {
    println!("runasd dry-run");
    println!("  service: {}", info.name);
    if info.display_name != info.name {
        println!("  display name: {}", info.display_name);
    }
    if !info.description.is_empty() {
        println!("  description: {}", info.description);
    }
    println!();

    println!("command:");
    println!("  executable: {}", settings.value("executable"));
    let parameters = settings.value("parameters");
    if !parameters.is_empty() {
        println!("  parameters: {parameters}");
    }
    if let Ok(Some(true)) = settings.bool_value("killProcessTree") {
        println!("  killProcessTree: true");
    }

    let hooks = info.hook_names();
    println!();
    println!("exit hooks ({}):", hooks.len());
    for hook in hooks {
        println!("  - {hook}");
    }

    debug!("dry-run complete (nothing started)");
}
