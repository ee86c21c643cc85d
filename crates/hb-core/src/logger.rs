//! Logger abstraction injected into bridge components
//!
//! Components never reach for a global logger. The host builds one root
//! logger at startup, derives named children from it, and passes them down.

/// Sink for human-readable log lines
pub trait Logger: Send + Sync {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Logger that forwards to `tracing`, tagging each event with its name
#[derive(Debug, Clone)]
pub struct TracingLogger {
    name: String,
}

impl TracingLogger {
    /// Root logger
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Named child, e.g. `root.child("helper")` logs as `root/helper`
    pub fn child(&self, name: &str) -> Self {
        Self {
            name: format!("{}/{}", self.name, name),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(logger = %self.name, "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(logger = %self.name, "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(logger = %self.name, "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(logger = %self.name, "{}", message);
    }
}
