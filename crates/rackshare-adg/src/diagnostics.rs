//! Error and warning collection during a decode.

/// Accumulates recoverable problems found while walking a document.
///
/// Errors mean the rack structure could not be fully understood; warnings are
/// isolated anomalies that were patched over with a default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a structural problem.
    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::debug!("parsing error: {}", message);
        self.errors.push(message);
    }

    /// Record a non-blocking anomaly.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::debug!("parsing warning: {}", message);
        self.warnings.push(message);
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Append everything from `other`, keeping order.
    pub fn merge(&mut self, other: Diagnostics) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Split into `(errors, warnings)`.
    pub fn into_parts(self) -> (Vec<String>, Vec<String>) {
        (self.errors, self.warnings)
    }
}
