//! HTTP proxy suppression guard
//!
//! Hook HTTP traffic must bypass any configured outbound proxy. The guard
//! removes the variable on creation and restores the saved value when
//! dropped, so the restore also runs when a hook errors out early.

use tracing::info;

pub const HTTP_PROXY: &str = "HTTP_PROXY";

/// RAII guard that clears an environment variable for its lifetime
#[derive(Debug)]
pub struct ProxyGuard {
    var: String,
    saved: Option<String>,
}

impl ProxyGuard {
    /// Clear `HTTP_PROXY` until the guard is dropped
    pub fn clear() -> Self {
        Self::clear_var(HTTP_PROXY)
    }

    /// Clear an arbitrary variable until the guard is dropped
    pub fn clear_var(name: &str) -> Self {
        let saved = std::env::var(name).ok();
        std::env::remove_var(name);
        info!("Unsetting env {}, whose value was {:?}", name, saved);
        Self {
            var: name.to_string(),
            saved,
        }
    }
}

impl Drop for ProxyGuard {
    fn drop(&mut self) {
        if let Some(value) = self.saved.take() {
            info!("Restoring env {} to value {}", self.var, value);
            std::env::set_var(&self.var, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own variable name so tests can run in parallel.

    #[test]
    fn test_cleared_during_lifetime_and_restored() {
        let var = "PROXY_GUARD_TEST_RESTORE";
        std::env::set_var(var, "http://proxy:8080");
        {
            let _guard = ProxyGuard::clear_var(var);
            assert!(std::env::var(var).is_err());
        }
        assert_eq!(std::env::var(var).unwrap(), "http://proxy:8080");
        std::env::remove_var(var);
    }

    #[test]
    fn test_unset_variable_stays_unset() {
        let var = "PROXY_GUARD_TEST_UNSET";
        std::env::remove_var(var);
        {
            let _guard = ProxyGuard::clear_var(var);
            assert!(std::env::var(var).is_err());
        }
        assert!(std::env::var(var).is_err());
    }

    #[test]
    fn test_restored_when_scope_unwinds() {
        let var = "PROXY_GUARD_TEST_PANIC";
        std::env::set_var(var, "http://proxy:8080");
        let result = std::panic::catch_unwind(|| {
            let _guard = ProxyGuard::clear_var(var);
            panic!("hook failed");
        });
        assert!(result.is_err());
        assert_eq!(std::env::var(var).unwrap(), "http://proxy:8080");
        std::env::remove_var(var);
    }
}
