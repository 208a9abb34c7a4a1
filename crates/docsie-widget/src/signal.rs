//! Load outcome delivery
//!
//! The script's `load`/`error` callbacks fire on the host's schedule, possibly
//! after the session that created them was superseded. Each container owns a
//! shared [`LoadCell`] carrying the live generation; a [`LoadSignal`] only
//! acts if its generation still matches, and the pending sender is taken on
//! first delivery, so a [`LoadFuture`] settles exactly once.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tracing::{debug, error, info};

use crate::error::BootstrapError;
use crate::lifecycle::{WidgetAction, WidgetEvent, WidgetPhase, handle_event};

/// Result delivered to the caller of `initialize`
pub type LoadOutcome = Result<(), BootstrapError>;

/// Per-container state shared between the manager and outstanding signals.
#[derive(Debug, Default)]
pub(crate) struct LoadCell {
    pub(crate) generation: u64,
    pub(crate) phase: WidgetPhase,
    pub(crate) pending: Option<oneshot::Sender<LoadOutcome>>,
}

pub(crate) type SharedCell = Arc<Mutex<LoadCell>>;

pub(crate) fn lock(cell: &SharedCell) -> MutexGuard<'_, LoadCell> {
    cell.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Callback handle given to the host with the injected script.
///
/// Cloneable so a host can wire it to both the `load` and `error` listeners.
#[derive(Debug, Clone)]
pub struct LoadSignal {
    cell: SharedCell,
    generation: u64,
    container: Arc<str>,
}

impl LoadSignal {
    pub(crate) fn new(cell: SharedCell, generation: u64, container: &str) -> Self {
        Self {
            cell,
            generation,
            container: Arc::from(container),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    /// Report that the script loaded. Returns whether the outcome was delivered.
    pub fn loaded(&self) -> bool {
        self.deliver(WidgetEvent::ScriptLoaded, None)
    }

    /// Report that the script failed to load. Returns whether the outcome was delivered.
    pub fn failed(&self, reason: impl Into<String>) -> bool {
        self.deliver(WidgetEvent::ScriptFailed, Some(reason.into()))
    }

    /// Whether this signal still belongs to the container's live session.
    pub fn is_current(&self) -> bool {
        lock(&self.cell).generation == self.generation
    }

    fn deliver(&self, event: WidgetEvent, reason: Option<String>) -> bool {
        let mut cell = lock(&self.cell);
        if cell.generation != self.generation {
            debug!(
                container = %self.container,
                generation = self.generation,
                live_generation = cell.generation,
                ?event,
                "ignoring load callback from superseded session"
            );
            return false;
        }

        let (phase, action) = handle_event(cell.phase, event);
        cell.phase = phase;

        let outcome = match action {
            WidgetAction::Resolve => {
                info!(container = %self.container, "Docsie script loaded successfully");
                Ok(())
            }
            WidgetAction::Reject => {
                let reason = reason.unwrap_or_else(|| "script error".to_owned());
                error!(container = %self.container, %reason, "failed to load Docsie script");
                Err(BootstrapError::LoadFailed(reason))
            }
            _ => return false,
        };

        match cell.pending.take() {
            // The receiver may have been dropped by a caller that stopped
            // waiting; the phase transition still stands.
            Some(tx) => {
                let _ = tx.send(outcome);
                true
            }
            None => false,
        }
    }
}

/// Single-resolution future returned by `initialize`.
///
/// Resolves `Ok(())` when the script loads, `Err(LoadFailed)` when it fails,
/// and `Err(Superseded)` when the session is cleaned up first.
#[derive(Debug)]
pub struct LoadFuture {
    rx: oneshot::Receiver<LoadOutcome>,
}

impl LoadFuture {
    pub(crate) fn new(rx: oneshot::Receiver<LoadOutcome>) -> Self {
        Self { rx }
    }

    /// Non-blocking check for an outcome that has already been delivered.
    pub fn try_outcome(&mut self) -> Option<LoadOutcome> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(BootstrapError::Superseded)),
        }
    }
}

impl Future for LoadFuture {
    type Output = LoadOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(BootstrapError::Superseded)))
    }
}
