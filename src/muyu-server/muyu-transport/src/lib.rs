// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Line-oriented links to the wooden-fish controller board.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use muyu_app::normalize_name;

mod dummy;
mod error;
mod framing;
mod serial;
mod tcp;

pub use dummy::DummyDeviceState;
pub use error::TransportError;
pub use framing::{LineReader, LineWriter, WRITE_TIMEOUT};

pub type TransportFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send + 'a>>;

/// Receiving half of a link.
pub trait LineSource: Send {
    /// Next complete line with surrounding whitespace removed.
    ///
    /// Waits at most a short read window and returns `Ok(None)` when no full
    /// line is available yet. Fails once the link is broken or closed.
    fn try_receive_line<'a>(&'a mut self) -> TransportFuture<'a, Option<String>>;
}

/// Sending half of a link. Delivery is never confirmed.
pub trait LineSink: Send {
    /// Write one line; a missing terminator is added.
    fn send_line<'a>(&'a mut self, line: &'a str) -> TransportFuture<'a, ()>;

    /// Flush and shut the sending half down.
    fn close<'a>(&'a mut self) -> TransportFuture<'a, ()>;
}

/// Connection details for opening a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAccess {
    Serial { path: String, baud: u32 },
    Tcp { addr: String },
    Dummy,
}

impl LinkAccess {
    /// Registry key of the link kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Serial { .. } => "serial",
            Self::Tcp { .. } => "tcp",
            Self::Dummy => "dummy",
        }
    }
}

impl fmt::Display for LinkAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serial { path, baud } => write!(f, "serial {} @ {} baud", path, baud),
            Self::Tcp { addr } => write!(f, "tcp {}", addr),
            Self::Dummy => write!(f, "dummy device"),
        }
    }
}

/// An opened link, split so that one task can read while another writes.
pub struct Link {
    pub label: String,
    pub source: Box<dyn LineSource>,
    pub sink: Box<dyn LineSink>,
}

impl Link {
    pub fn new(
        label: impl Into<String>,
        source: impl LineSource + 'static,
        sink: impl LineSink + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            source: Box::new(source),
            sink: Box::new(sink),
        }
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link").field("label", &self.label).finish()
    }
}

pub type LinkFactory = fn(LinkAccess) -> TransportFuture<'static, Link>;

/// Context for registering and opening link kinds.
#[derive(Clone, Default)]
pub struct RegistrationContext {
    factories: HashMap<String, LinkFactory>,
}

impl RegistrationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a link factory under a stable name (e.g. "serial").
    pub fn register_link(&mut self, name: &str, factory: LinkFactory) {
        self.factories.insert(normalize_name(name), factory);
    }

    pub fn is_link_registered(&self, name: &str) -> bool {
        self.factories.contains_key(&normalize_name(name))
    }

    /// List registered link names.
    pub fn registered_links(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Open a link of the kind named by `access`.
    pub async fn open_link(&self, access: LinkAccess) -> Result<Link, TransportError> {
        let factory = self.factories.get(access.kind()).ok_or_else(|| {
            TransportError::Unsupported(format!(
                "{} (available: {})",
                access.kind(),
                self.registered_links().join(", ")
            ))
        })?;
        factory(access).await
    }
}

/// Register all built-in link kinds on a context.
pub fn register_builtin_links_on(context: &mut RegistrationContext) {
    context.register_link("serial", serial_factory);
    context.register_link("tcp", tcp_factory);
    context.register_link("dummy", dummy_factory);
}

fn serial_factory(access: LinkAccess) -> TransportFuture<'static, Link> {
    Box::pin(async move {
        match access {
            LinkAccess::Serial { path, baud } => serial::open(&path, baud),
            other => Err(TransportError::Unsupported(format!(
                "serial factory cannot open {}",
                other
            ))),
        }
    })
}

fn tcp_factory(access: LinkAccess) -> TransportFuture<'static, Link> {
    Box::pin(async move {
        match access {
            LinkAccess::Tcp { addr } => tcp::connect(&addr).await,
            other => Err(TransportError::Unsupported(format!(
                "tcp factory cannot open {}",
                other
            ))),
        }
    })
}

fn dummy_factory(_access: LinkAccess) -> TransportFuture<'static, Link> {
    Box::pin(async move { Ok(dummy::open()) })
}
