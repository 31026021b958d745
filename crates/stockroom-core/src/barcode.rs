//! # Barcode Resolution
//!
//! The rule that turns a scanned code into "edit this product" or
//! "add a new one", and the client-side session that feeds it.
//!
//! ## Resolution Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   device ──► ScanSession::observe(code)                                 │
//! │                 │  same code as last one? ──► suppressed (None)         │
//! │                 ▼                                                       │
//! │              ScanTicket { generation, code }                            │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │   GET /api/products/barcode/{code}/  (Resolution::resolve on server)    │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │   ScanSession::accepts(ticket)? ── no ──► discard (stopped / reset)     │
//! │                 │ yes                                                   │
//! │                 ▼                                                       │
//! │   Resolution::route()                                                   │
//! │     ├── ExactFound ──► ScanRoute::EditExisting(product)                 │
//! │     └── NotFound   ──► ScanRoute::AddNew { barcode, suggestions }       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Similar Matching
//! A product is *similar* when its barcode starts with the first
//! [`SIMILAR_PREFIX_LEN`] characters of the scanned code (the whole code
//! when shorter). At most [`MAX_SIMILAR`] candidates, lowest id first, and
//! only when no exact match exists.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::Product;
use crate::{MAX_SIMILAR, SIMILAR_PREFIX_LEN};

// =============================================================================
// Resolution
// =============================================================================

/// Returns the leading part of `code` used for similar matching.
///
/// Cuts on a character boundary, so multi-byte input is safe.
pub fn similarity_prefix(code: &str) -> &str {
    match code.char_indices().nth(SIMILAR_PREFIX_LEN) {
        Some((idx, _)) => &code[..idx],
        None => code,
    }
}

/// Outcome of looking up one scanned code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Resolution {
    /// Product whose barcode equals the code exactly.
    pub exact: Option<Product>,
    /// Prefix matches, filled only when `exact` is `None`.
    pub similar: Vec<Product>,
}

/// Classification the caller routes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionKind {
    ExactFound,
    NotFound,
}

impl Resolution {
    /// Applies the exact/similar rule to `candidates`.
    ///
    /// `candidates` must be ordered by id; the store narrows them to the
    /// similarity prefix, but any superset gives the same answer.
    pub fn resolve(code: &str, candidates: &[Product]) -> Self {
        if let Some(exact) = candidates
            .iter()
            .find(|p| p.barcode.as_deref() == Some(code))
        {
            return Resolution {
                exact: Some(exact.clone()),
                similar: Vec::new(),
            };
        }

        let prefix = similarity_prefix(code);
        let similar = candidates
            .iter()
            .filter(|p| {
                p.barcode
                    .as_deref()
                    .is_some_and(|barcode| barcode.starts_with(prefix))
            })
            .take(MAX_SIMILAR)
            .cloned()
            .collect();

        Resolution {
            exact: None,
            similar,
        }
    }

    pub fn kind(&self) -> ResolutionKind {
        if self.exact.is_some() {
            ResolutionKind::ExactFound
        } else {
            ResolutionKind::NotFound
        }
    }

    /// True when there is neither an exact nor a similar match.
    pub fn is_empty(&self) -> bool {
        self.exact.is_none() && self.similar.is_empty()
    }

    /// Decides which screen the scan leads to.
    pub fn route(self, code: &str) -> ScanRoute {
        match self.exact {
            Some(product) => ScanRoute::EditExisting(product),
            None => ScanRoute::AddNew {
                barcode: code.to_string(),
                suggestions: self.similar,
            },
        }
    }
}

/// Where the client goes after a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanRoute {
    /// Open the edit form for this product.
    EditExisting(Product),
    /// Open the add form with the barcode prefilled, offering the
    /// suggestions as products the user may edit instead.
    AddNew {
        barcode: String,
        suggestions: Vec<Product>,
    },
}

// =============================================================================
// Scan Session
// =============================================================================

/// Per-screen scan state: last accepted code and a generation counter.
///
/// Owned by the scan screen for as long as it is open. A lookup issued
/// under one generation is discarded if the session was reset or stopped
/// before it completed.
#[derive(Debug, Clone)]
pub struct ScanSession {
    generation: u64,
    last_code: Option<String>,
    running: bool,
}

/// Permission to run one lookup, tied to the generation that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTicket {
    generation: u64,
    code: String,
}

impl ScanTicket {
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl Default for ScanSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanSession {
    /// Starts a running session with no code seen yet.
    pub fn new() -> Self {
        ScanSession {
            generation: 0,
            last_code: None,
            running: true,
        }
    }

    /// Feeds one decoded value.
    ///
    /// Returns a ticket when the value should be resolved, `None` when it is
    /// blank, identical to the last accepted value, or the session stopped.
    pub fn observe(&mut self, raw: &str) -> Option<ScanTicket> {
        if !self.running {
            return None;
        }
        let code = raw.trim();
        if code.is_empty() || self.last_code.as_deref() == Some(code) {
            return None;
        }
        self.last_code = Some(code.to_string());
        Some(ScanTicket {
            generation: self.generation,
            code: code.to_string(),
        })
    }

    /// Forgets the last code so the same value can be scanned again.
    pub fn reset(&mut self) {
        self.last_code = None;
        self.generation += 1;
    }

    /// Stops the session. Every outstanding ticket becomes stale.
    pub fn stop(&mut self) {
        self.running = false;
        self.generation += 1;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn last_code(&self) -> Option<&str> {
        self.last_code.as_deref()
    }

    /// True when a lookup result for `ticket` may still be acted upon.
    pub fn accepts(&self, ticket: &ScanTicket) -> bool {
        self.running && ticket.generation == self.generation
    }
}

// =============================================================================
// Scan Device
// =============================================================================

/// A source of decoded barcodes (camera, keyboard-wedge scanner, ...).
pub trait ScanDevice {
    type Error;

    /// Claims the underlying hardware.
    fn start(&mut self) -> Result<(), Self::Error>;

    /// Blocks until the next decoded value. `Ok(None)` means the device
    /// has no more input.
    fn next_code(&mut self) -> Result<Option<String>, Self::Error>;

    /// Gives the hardware back. Must be safe to call more than once.
    fn release(&mut self);
}

/// Holds a started [`ScanDevice`] and releases it when dropped,
/// including on early returns and unwinding.
pub struct DeviceGuard<'a, D: ScanDevice> {
    device: &'a mut D,
}

impl<'a, D: ScanDevice> DeviceGuard<'a, D> {
    /// Starts `device`. On failure nothing is held.
    pub fn acquire(device: &'a mut D) -> Result<Self, D::Error> {
        device.start()?;
        Ok(DeviceGuard { device })
    }

    pub fn next_code(&mut self) -> Result<Option<String>, D::Error> {
        self.device.next_code()
    }

    /// The held device, for reads the trait does not cover.
    pub fn device_mut(&mut self) -> &mut D {
        self.device
    }
}

impl<D: ScanDevice> Drop for DeviceGuard<'_, D> {
    fn drop(&mut self) {
        self.device.release();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
