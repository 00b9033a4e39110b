//! Process-global environment mutation helpers.
//!
//! Configuration is read from the process environment, so tests that tweak
//! variables must serialize on [`env_lock`] and restore state with [`EnvGuard`].

use std::sync::{Mutex, OnceLock};

/// Return the global lock used to serialize environment mutations in tests.
pub fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

#[allow(unused_unsafe)]
fn write_env(key: &str, value: Option<&str>) {
    // SAFETY: Callers must hold `env_lock` while test threads may run in parallel.
    unsafe {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
}

/// Restores an environment variable value on drop.
pub struct EnvGuard {
    key: String,
    previous: Option<String>,
}

impl EnvGuard {
    /// Set `key=value` until the guard is dropped.
    pub fn set(key: &str, value: &str) -> Self {
        Self::replace(key, Some(value))
    }

    /// Unset `key` until the guard is dropped.
    pub fn remove(key: &str) -> Self {
        Self::replace(key, None)
    }

    fn replace(key: &str, value: Option<&str>) -> Self {
        let previous = std::env::var(key).ok();
        write_env(key, value);
        Self {
            key: key.to_string(),
            previous,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        write_env(self.key.as_str(), self.previous.as_deref());
    }
}

#[cfg(test)]
mod tests {
    use super::{env_lock, EnvGuard};

    #[test]
    fn env_guard_restores_previous_value() {
        let _lock = env_lock().lock().expect("env lock");
        let key = "LOGPASTE_TEST_ENV_GUARD_RESTORE";
        let _baseline = EnvGuard::set(key, "before");
        {
            let _override = EnvGuard::set(key, "after");
            assert_eq!(std::env::var(key).ok().as_deref(), Some("after"));
        }
        assert_eq!(std::env::var(key).ok().as_deref(), Some("before"));
    }

    #[test]
    fn env_guard_remove_restores_missing_value() {
        let _lock = env_lock().lock().expect("env lock");
        let key = "LOGPASTE_TEST_ENV_GUARD_REMOVE";
        {
            let _removed = EnvGuard::remove(key);
            assert!(std::env::var(key).is_err());
        }
        assert!(std::env::var(key).is_err());
    }
}
