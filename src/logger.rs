//! Diagnostic sink the loader reports through.

/// Severity of a loader message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Trait for applications that want loader output somewhere specific.
pub trait ModLogger: Send + Sync {
    /// Log a message.
    fn log(&self, level: LogLevel, message: &str);

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}

/// Default logger, forwarding to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl ModLogger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => tracing::info!(component = "modding", "{}", message),
            LogLevel::Warn => tracing::warn!(component = "modding", "{}", message),
            LogLevel::Error => tracing::error!(component = "modding", "{}", message),
        }
    }
}
