// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

mod config;
mod interaction_task;
mod listener;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tokio::signal;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use muyu_app::{init_logging, ConfigFile};
use muyu_core::{
    DynResult, ExpressionSampler, HardwareEvent, InteractionMachine, NoFaceSampler,
    ScriptedSampler,
};
use muyu_transport::{register_builtin_links_on, LinkAccess, RegistrationContext};

use config::{SamplerKind, ServerConfig};
use interaction_task::{InteractionTaskConfig, LinkUpdate, TracingObserver};

const PKG_DESCRIPTION: &str = concat!(env!("CARGO_PKG_NAME"), " - wooden fish interaction daemon");
const SHUTDOWN_GRACE: Duration = Duration::from_millis(1500);

#[derive(Debug, Parser)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = PKG_DESCRIPTION,
)]
struct Cli {
    /// Path to configuration file
    #[arg(long = "config", short = 'C', value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print example configuration and exit
    #[arg(long = "print-config")]
    print_config: bool,
    /// How to reach the controller board
    #[arg(short = 'l', long = "link", value_enum)]
    link: Option<LinkKind>,
    /// Board address:
    /// when link is serial: <path> <baud>;
    /// when link is TCP: <host>:<port>
    #[arg(value_name = "DEVICE_ADDR")]
    device_addr: Option<String>,
    /// Log level override (trace, debug, info, warn, error)
    #[arg(long = "log-level")]
    log_level: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LinkKind {
    Serial,
    Tcp,
    Dummy,
}

/// Parse a serial device address of the form "<path> <baud>".
fn parse_serial_addr(addr: &str) -> DynResult<(String, u32)> {
    let mut parts = addr.split_whitespace();
    let path = parts
        .next()
        .ok_or("Serial device address must be '<path> <baud>'")?;
    let baud_str = parts
        .next()
        .ok_or("Serial device address must be '<path> <baud>'")?;
    if parts.next().is_some() {
        return Err("Serial device address must be '<path> <baud>' (got extra data)".into());
    }
    let baud: u32 = baud_str
        .parse()
        .map_err(|e| format!("Invalid baud '{}': {}", baud_str, e))?;
    if baud == 0 {
        return Err("Baud rate must be > 0".into());
    }
    Ok((path.to_string(), baud))
}

/// Merge CLI arguments over `[link]` into the access to open.
fn resolve_link(cli: &Cli, cfg: &ServerConfig) -> DynResult<LinkAccess> {
    let link_type = cli
        .link
        .map(|kind| match kind {
            LinkKind::Serial => "serial",
            LinkKind::Tcp => "tcp",
            LinkKind::Dummy => "dummy",
        })
        .or(cfg.link.link_type.as_deref());

    match link_type {
        Some("serial") | None => {
            let (path, baud) = if let Some(ref addr) = cli.device_addr {
                parse_serial_addr(addr)?
            } else if let (Some(port), Some(baud)) = (&cfg.link.port, cfg.link.baud) {
                (port.clone(), baud)
            } else {
                return Err("Serial link requires port and baud. Use '<path> <baud>' argument or set [link].port and .baud in config.".into());
            };
            Ok(LinkAccess::Serial { path, baud })
        }
        Some("tcp") => {
            let addr = if let Some(ref addr) = cli.device_addr {
                addr.clone()
            } else if let (Some(host), Some(port)) = (&cfg.link.host, cfg.link.tcp_port) {
                format!("{}:{}", host, port)
            } else {
                return Err("TCP link requires host:port. Use argument or set [link].host and .tcp_port in config.".into());
            };
            Ok(LinkAccess::Tcp { addr })
        }
        Some("dummy") => Ok(LinkAccess::Dummy),
        Some(other) => Err(format!("Unknown link type: {}", other).into()),
    }
}

fn build_machine(cfg: &ServerConfig) -> DynResult<InteractionMachine> {
    let sampler: Box<dyn ExpressionSampler> = match cfg.sensing.sampler {
        SamplerKind::NoFace => Box::new(NoFaceSampler),
        SamplerKind::Scripted => Box::new(ScriptedSampler::new(cfg.sensing.parsed_script()?)),
    };
    let mut machine = InteractionMachine::new(cfg.phase_timings(), sampler)
        .with_profile(cfg.effects.clone())
        .with_fallback(cfg.sensing.fallback);
    machine.register_observer(Arc::new(TracingObserver));
    Ok(machine)
}

/// Owns the device link on behalf of the control loop and its listener.
struct LinkSupervisor {
    registry: RegistrationContext,
    access: LinkAccess,
    link_tx: mpsc::Sender<LinkUpdate>,
    events_tx: mpsc::Sender<HardwareEvent>,
    poll_interval: Duration,
    shutdown_rx: watch::Receiver<bool>,
    listener: Option<JoinHandle<()>>,
}

impl LinkSupervisor {
    /// Open the link, hand its sending half to the control loop and start a
    /// listener on its receiving half.
    async fn attach(&mut self) {
        let link = match self.registry.open_link(self.access.clone()).await {
            Ok(link) => link,
            Err(e) => {
                error!("Failed to open {}: {}", self.access, e);
                warn!("Running without a device link; send SIGHUP to retry");
                return;
            }
        };
        info!("Opened {}", link.label);

        if self.link_tx.send(LinkUpdate::Attach(link.sink)).await.is_err() {
            error!("Interaction loop is gone, not attaching link");
            return;
        }

        let source = link.source;
        let events_tx = self.events_tx.clone();
        let shutdown_rx = self.shutdown_rx.clone();
        let poll_interval = self.poll_interval;
        self.listener = Some(tokio::spawn(async move {
            match listener::run_event_listener(source, events_tx, poll_interval, shutdown_rx).await
            {
                Ok(()) => {}
                Err(e) if e.is_closed() => {
                    warn!("Device link closed; send SIGHUP to reconnect");
                }
                Err(e) => {
                    error!("Event listener error: {}", e);
                }
            }
        }));
    }

    /// Release both halves of the current link, then open it again.
    ///
    /// Serial ports are opened exclusively, so the old port has to be
    /// closed before the new open.
    async fn reconnect(&mut self) {
        if let Some(handle) = self.listener.take() {
            handle.abort();
            let _ = handle.await;
        }
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.link_tx.send(LinkUpdate::Detach(ack_tx)).await.is_ok() {
            let _ = ack_rx.await;
        }
        self.attach().await;
    }

    fn into_listener(self) -> Option<JoinHandle<()>> {
        self.listener
    }
}

/// SIGHUP requests a reconnect. Never fires on platforms without it.
struct ReconnectSignal {
    #[cfg(unix)]
    inner: Option<signal::unix::Signal>,
}

impl ReconnectSignal {
    fn new() -> Self {
        #[cfg(unix)]
        let inner = match signal::unix::signal(signal::unix::SignalKind::hangup()) {
            Ok(sig) => Some(sig),
            Err(e) => {
                warn!("SIGHUP reconnect unavailable: {}", e);
                None
            }
        };
        Self {
            #[cfg(unix)]
            inner,
        }
    }

    async fn recv(&mut self) {
        #[cfg(unix)]
        {
            if let Some(sig) = self.inner.as_mut() {
                if sig.recv().await.is_some() {
                    return;
                }
            }
        }
        std::future::pending::<()>().await
    }
}

#[tokio::main]
async fn main() -> DynResult<()> {
    let mut registry = RegistrationContext::new();
    register_builtin_links_on(&mut registry);

    let cli = Cli::parse();

    if cli.print_config {
        println!("{}", ServerConfig::example_combined_toml());
        return Ok(());
    }

    let (cfg, config_path) = ServerConfig::load(cli.config.as_deref())?;
    cfg.validate()
        .map_err(|e| format!("Invalid server configuration: {}", e))?;

    init_logging(
        cli.log_level
            .as_deref()
            .or(cfg.general.log_level.as_deref()),
    );

    if let Some(ref path) = config_path {
        info!("Loaded configuration from {}", path.display());
    }

    let access = resolve_link(&cli, &cfg)?;
    info!("Starting muyu-server (link: {})", access);

    if cfg.effects.has_extras() {
        info!("Auxiliary effects: {:?}", cfg.effects);
    }

    let machine = build_machine(&cfg)?;

    let (events_tx, events_rx) = mpsc::channel::<HardwareEvent>(cfg.queue.capacity);
    let (link_tx, link_rx) = mpsc::channel::<LinkUpdate>(1);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut task_handles: Vec<JoinHandle<()>> = Vec::new();

    let task_config = InteractionTaskConfig {
        tick: Duration::from_millis(cfg.timing.tick_ms),
        progress_every: Duration::from_millis(cfg.timing.progress_log_ms),
        self_test_on_start: cfg.behavior.self_test_on_start,
        stop_all_on_shutdown: cfg.behavior.stop_all_on_shutdown,
    };
    let interaction_shutdown_rx = shutdown_rx.clone();
    let interaction_handle = tokio::spawn(interaction_task::run_interaction_task(
        machine,
        task_config,
        events_rx,
        link_rx,
        interaction_shutdown_rx,
    ));

    let mut supervisor = LinkSupervisor {
        registry,
        access,
        link_tx,
        events_tx,
        poll_interval: Duration::from_millis(cfg.timing.listener_poll_ms),
        shutdown_rx,
        listener: None,
    };
    supervisor.attach().await;

    let mut reconnect = ReconnectSignal::new();
    loop {
        tokio::select! {
            res = signal::ctrl_c() => {
                res?;
                info!("Ctrl+C received, shutting down");
                break;
            }
            _ = reconnect.recv() => {
                info!("SIGHUP received, reopening {}", supervisor.access);
                supervisor.reconnect().await;
            }
        }
    }

    let _ = shutdown_tx.send(true);
    task_handles.extend(supervisor.into_listener());

    // Give the control loop time to switch the effects off.
    let mut interaction_handle = interaction_handle;
    if tokio::time::timeout(SHUTDOWN_GRACE, &mut interaction_handle)
        .await
        .is_err()
    {
        warn!("Interaction loop did not stop in time");
        interaction_handle.abort();
    }

    for handle in &task_handles {
        if !handle.is_finished() {
            handle.abort();
        }
    }
    for handle in task_handles {
        let _ = handle.await;
    }
    Ok(())
}
