//! Per-request observation hooks
//!
//! Observers see every completed dispatch, notifications included, and are
//! called synchronously before the outcome is assembled. They cannot change
//! what goes on the wire.

use std::sync::atomic::{AtomicU64, Ordering};

use busrpc_json_rpc::{JsonRpcErrorObject, RequestId};
use tracing::{debug, warn};

/// Receives success/failure of each dispatched request
pub trait DispatchObserver: Send + Sync {
    /// A handler resolved. `id` is `None` for notifications.
    fn on_success(&self, method: &str, id: Option<&RequestId>) {
        let _ = (method, id);
    }

    /// Dispatch failed: unknown method or handler error.
    fn on_error(&self, method: &str, id: Option<&RequestId>, error: &JsonRpcErrorObject) {
        let _ = (method, id, error);
    }
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl DispatchObserver for NoopObserver {}

/// Observer that logs each outcome through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl DispatchObserver for TracingObserver {
    fn on_success(&self, method: &str, id: Option<&RequestId>) {
        debug!(method, id = ?id, "Request succeeded");
    }

    fn on_error(&self, method: &str, id: Option<&RequestId>, error: &JsonRpcErrorObject) {
        warn!(
            method,
            id = ?id,
            code = error.code,
            "Request failed: {}",
            error.message
        );
    }
}

/// Snapshot of [`CountingObserver`] totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub succeeded: u64,
    pub failed: u64,
}

impl DispatchStats {
    pub fn total(&self) -> u64 {
        self.succeeded + self.failed
    }
}

/// Observer that counts outcomes, for metrics exporters and tests
#[derive(Debug, Default)]
pub struct CountingObserver {
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl CountingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

impl DispatchObserver for CountingObserver {
    fn on_success(&self, _method: &str, _id: Option<&RequestId>) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    fn on_error(&self, _method: &str, _id: Option<&RequestId>, _error: &JsonRpcErrorObject) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }
}
