//! Fault boundary around model loading and rendering
//!
//! A failed (or panicking) step is recorded instead of propagated; the
//! boundary stays faulted until it is reset.

use std::fmt::Display;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::error;

/// Result of a guarded step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guarded<T> {
    Ok(T),
    Faulted(String),
}

impl<T> Guarded<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Ok(v) => Some(v),
            Self::Faulted(_) => None,
        }
    }

    pub fn is_faulted(&self) -> bool {
        matches!(self, Self::Faulted(_))
    }
}

/// Records the most recent fault of a guarded step
#[derive(Debug, Default)]
pub struct RenderGuard {
    fault: Option<String>,
    faults: u64,
}

impl RenderGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `step`, catching both errors and panics
    pub fn run<T, E, F>(&mut self, step: F) -> Guarded<T>
    where
        E: Display,
        F: FnOnce() -> Result<T, E>,
    {
        let message = match catch_unwind(AssertUnwindSafe(step)) {
            Ok(Ok(value)) => return Guarded::Ok(value),
            Ok(Err(e)) => e.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };
        self.record(message.clone());
        Guarded::Faulted(message)
    }

    /// Record a fault raised outside `run` (renderer callbacks)
    pub fn record(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!("Guarded step failed: {}", message);
        self.faults += 1;
        self.fault = Some(message);
    }

    pub fn fault(&self) -> Option<&str> {
        self.fault.as_deref()
    }

    pub fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }

    /// Total faults since creation
    pub fn fault_count(&self) -> u64 {
        self.faults
    }

    pub fn reset(&mut self) {
        self.fault = None;
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown error".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_step_passes_through() {
        let mut guard = RenderGuard::new();
        let out = guard.run(|| Ok::<_, String>(7));
        assert_eq!(out, Guarded::Ok(7));
        assert!(!guard.is_faulted());
    }

    #[test]
    fn test_error_is_recorded() {
        let mut guard = RenderGuard::new();
        let out = guard.run(|| Err::<(), _>("mesh decode failed"));
        assert!(out.is_faulted());
        assert_eq!(guard.fault(), Some("mesh decode failed"));

        guard.reset();
        assert!(!guard.is_faulted());
        assert_eq!(guard.fault_count(), 1);
    }

    #[test]
    fn test_panic_is_caught() {
        let mut guard = RenderGuard::new();
        let out: Guarded<()> = guard.run(|| -> Result<(), String> { panic!("bad geometry") });
        assert_eq!(out, Guarded::Faulted("bad geometry".into()));
    }
}
