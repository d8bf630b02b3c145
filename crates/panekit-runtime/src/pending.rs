#![forbid(unsafe_code)]

//! In-flight open bookkeeping: tickets, cancellation flags, and the
//! delivery channel loads come back on.
//!
//! Every asynchronous open or preload gets an [`OpenTicket`] and a
//! [`CancelFlag`]. The flag is shared with the loader; a load that is
//! cancelled before delivery is dropped at drain time, so a late result
//! can never resurrect an open the caller abandoned.
//!
//! # Invariants
//!
//! 1. Tickets are unique for the lifetime of the table.
//! 2. A cancelled ticket never yields a delivery from `drain`.
//! 3. Deliveries for unknown tickets (already drained or cancelled) are
//!    discarded, not errors.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;

use ahash::AHashMap;
use panekit_core::PanelKey;
use panekit_core::view::PanelData;

use crate::loader::{LoadError, PanelBlueprint};

// ---------------------------------------------------------------------------
// Tickets and flags
// ---------------------------------------------------------------------------

/// Identifier for one in-flight open or preload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpenTicket(u64);

impl OpenTicket {
    /// Raw ticket number, for logs.
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Shared cancellation flag for one in-flight load.
///
/// Cloned into the loader; setting it is a one-way latch.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// A fresh, uncancelled flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch the flag.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether the flag has been latched.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// ---------------------------------------------------------------------------
// Delivery channel
// ---------------------------------------------------------------------------

/// One finished load, keyed back to its ticket.
pub struct LoadDelivery {
    /// The ticket the load was started under.
    pub ticket: OpenTicket,
    /// The panel type that was loaded.
    pub key: PanelKey,
    /// The blueprint, or why it could not be built.
    pub result: Result<PanelBlueprint, LoadError>,
}

/// Sending half handed to loaders.
#[derive(Clone)]
pub struct LoadSink {
    tx: mpsc::Sender<LoadDelivery>,
}

impl LoadSink {
    /// Deliver a finished load. A sink outliving its table delivers into
    /// the void, which is harmless.
    pub fn deliver(&self, delivery: LoadDelivery) {
        if self.tx.send(delivery).is_err() {
            tracing::debug!("load delivery dropped: pending table is gone");
        }
    }
}

// ---------------------------------------------------------------------------
// Pending table
// ---------------------------------------------------------------------------

/// What to do with a load once it arrives.
pub struct PendingOpen {
    /// The ticket this entry belongs to.
    pub ticket: OpenTicket,
    /// The panel type being loaded.
    pub key: PanelKey,
    /// Shared flag checked at drain time.
    pub cancel: CancelFlag,
    /// `true` for preloads: the instance goes to the preload pool
    /// instead of being opened.
    pub preload: bool,
    /// Stack to push onto after opening, if any.
    pub stack: Option<String>,
    /// Whether the push should hide the covered top.
    pub hide_previous: bool,
    /// Payload for the open sequence.
    pub data: Option<Box<dyn PanelData>>,
}

/// All in-flight loads plus the channel their results come back on.
pub struct PendingTable {
    next_ticket: u64,
    pending: AHashMap<u64, PendingOpen>,
    tx: mpsc::Sender<LoadDelivery>,
    rx: mpsc::Receiver<LoadDelivery>,
}

impl Default for PendingTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingTable {
    /// An empty table with its own channel.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            next_ticket: 0,
            pending: AHashMap::new(),
            tx,
            rx,
        }
    }

    /// A sink for loaders to deliver into.
    #[must_use]
    pub fn sink(&self) -> LoadSink {
        LoadSink {
            tx: self.tx.clone(),
        }
    }

    /// Record a new in-flight load and mint its ticket and flag.
    pub fn begin(
        &mut self,
        key: PanelKey,
        preload: bool,
        stack: Option<String>,
        hide_previous: bool,
        data: Option<Box<dyn PanelData>>,
    ) -> (OpenTicket, CancelFlag) {
        let ticket = OpenTicket(self.next_ticket);
        self.next_ticket += 1;
        let cancel = CancelFlag::new();
        self.pending.insert(
            ticket.0,
            PendingOpen {
                ticket,
                key,
                cancel: cancel.clone(),
                preload,
                stack,
                hide_previous,
                data,
            },
        );
        (ticket, cancel)
    }

    /// Cancel one in-flight load. Returns `false` for unknown or
    /// already-finished tickets.
    pub fn cancel(&mut self, ticket: OpenTicket) -> bool {
        match self.pending.remove(&ticket.0) {
            Some(entry) => {
                entry.cancel.cancel();
                tracing::debug!(ticket = ticket.0, panel = %entry.key, "open cancelled");
                true
            }
            None => false,
        }
    }

    /// Number of loads still in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Whether `ticket` is still in flight.
    #[must_use]
    pub fn is_pending(&self, ticket: OpenTicket) -> bool {
        self.pending.contains_key(&ticket.0)
    }

    /// Collect every delivery whose ticket is still live, pairing it
    /// with its recorded intent. Cancelled and unknown tickets are
    /// dropped here.
    pub fn drain(&mut self) -> Vec<(PendingOpen, Result<PanelBlueprint, LoadError>)> {
        let mut ready = Vec::new();
        while let Ok(delivery) = self.rx.try_recv() {
            let Some(entry) = self.pending.remove(&delivery.ticket.0) else {
                tracing::debug!(
                    ticket = delivery.ticket.0,
                    panel = %delivery.key,
                    "discarding delivery for dead ticket"
                );
                continue;
            };
            if entry.cancel.is_cancelled() {
                continue;
            }
            ready.push((entry, delivery.result));
        }
        ready
    }
}

impl std::fmt::Debug for PendingTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingTable")
            .field("in_flight", &self.pending.len())
            .field("next_ticket", &self.next_ticket)
            .finish()
    }
}
