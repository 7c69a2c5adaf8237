//! Round-robin nameserver pool.

use std::sync::atomic::{AtomicUsize, Ordering};


/// A fixed set of nameservers handed out in turn.
///
/// The cursor is a single atomic counter, so `next` never blocks. There is no
/// health tracking: a nameserver that keeps failing stays in rotation.
#[derive(Debug)]
pub struct NameserverPool {
    nameservers: Vec<String>,
    cursor: AtomicUsize,
}

impl NameserverPool {
    /// Builds a pool from `host:port` addresses, as left by
    /// [`ScannerConfig::normalized`](crate::ScannerConfig::normalized).
    ///
    /// Returns `None` for an empty list.
    pub fn new(nameservers: Vec<String>) -> Option<Self> {
        if nameservers.is_empty() {
            return None;
        }
        Some(Self {
            nameservers,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Returns the next nameserver in rotation.
    pub fn next(&self) -> &str {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.nameservers.len();
        &self.nameservers[index]
    }

    pub fn nameservers(&self) -> &[String] {
        &self.nameservers
    }

    pub fn len(&self) -> usize {
        self.nameservers.len()
    }

    /// Always false: an empty pool cannot be built.
    pub fn is_empty(&self) -> bool {
        self.nameservers.is_empty()
    }
}
