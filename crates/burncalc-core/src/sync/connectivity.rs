//! Connectivity oracle.

use std::sync::atomic::{AtomicBool, Ordering};

/// Best-effort reachability check. May be wrong either way; the
/// reconciler's retry-by-recurrence absorbs its mistakes.
pub trait ConnectivityOracle {
    fn is_online(&self) -> bool;
}

/// Oracle whose answer is set by the host (e.g. from a platform
/// reachability callback).
#[derive(Debug)]
pub struct StaticConnectivity {
    online: AtomicBool,
}

impl StaticConnectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl ConnectivityOracle for StaticConnectivity {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        let oracle = StaticConnectivity::new(false);
        assert!(!oracle.is_online());
        oracle.set_online(true);
        assert!(oracle.is_online());
    }
}
