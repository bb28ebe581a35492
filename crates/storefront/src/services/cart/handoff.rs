//! Checkout handoff.
//!
//! A successful checkout returns a messaging deep link that the customer
//! follows to place the order. Where the link goes is up to the host.

use tracing::info;

/// Opens the link returned by checkout.
pub trait LinkOpener: Send + Sync {
    fn open(&self, url: &str);
}

/// Logs the link instead of opening it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingOpener;

impl LinkOpener for TracingOpener {
    fn open(&self, url: &str) {
        info!(url, "Checkout link ready");
    }
}
