//! # Timeout service (C3)
//!
//! One shared boolean, set by whichever timer ISR is currently armed.
//! There is exactly one main thread; cooperative polling of this flag is
//! sufficient and avoids any re-entrancy concern on the shared UART.
//! Modeled as a relaxed atomic rather than a plain `static mut bool` so
//! the compiler cannot elide reads inside the polling loops below — the
//! crate's one concession to "this is observed from an ISR" without
//! reaching for a lock nothing here needs.

use core::sync::atomic::{AtomicBool, Ordering};

/// The cross-ISR/main-loop timeout flag.
#[derive(Debug, Default)]
pub struct Timeout {
    flag: AtomicBool,
}

impl Timeout {
    pub const fn new() -> Self {
        Timeout { flag: AtomicBool::new(false) }
    }

    /// Called from a timer ISR.
    pub fn signal(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Clear the flag. Every polling loop that consults [`Timeout::is_set`]
    /// must clear it before returning to the caller.
    pub fn clear(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}

/// Poll `cond` until it returns `Some(value)` or the shared timeout flag
/// is set, clearing the flag before returning either way. This is the
/// crate's one polling primitive, replacing what would otherwise be a
/// `while (!TIMEOUT)` body repeated at every listen site.
pub fn wait_until<T>(timeout: &Timeout, mut cond: impl FnMut() -> Option<T>) -> Option<T> {
    loop {
        if let Some(v) = cond() {
            timeout.clear();
            return Some(v);
        }
        if timeout.is_set() {
            timeout.clear();
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_until_returns_value_without_timeout() {
        let timeout = Timeout::new();
        let mut calls = 0;
        let result = wait_until(&timeout, || {
            calls += 1;
            if calls >= 3 { Some(42) } else { None }
        });
        assert_eq!(result, Some(42));
        assert!(!timeout.is_set());
    }

    #[test]
    fn wait_until_gives_up_on_timeout() {
        let timeout = Timeout::new();
        timeout.signal();
        let result = wait_until(&timeout, || -> Option<()> { None });
        assert_eq!(result, None);
        assert!(!timeout.is_set());
    }
}
