//! Advisory messages collected while stages run.
//!
//! Stages receive a `&mut Diagnostics` instead of writing to a global logger. Every entry is
//! mirrored to `tracing` as it is recorded, so applications that installed a subscriber see
//! the same messages in their logs, while tests can inspect the entries directly.

use serde::Serialize;

/// Severity of a diagnostic entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warn,
}

/// One advisory message emitted by a stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub stage: String,
    pub level: Level,
    pub message: String,
}

/// Collects diagnostics in emission order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn debug(&mut self, stage: &str, message: impl Into<String>) {
        self.push(stage, Level::Debug, message.into());
    }

    pub fn info(&mut self, stage: &str, message: impl Into<String>) {
        self.push(stage, Level::Info, message.into());
    }

    pub fn warn(&mut self, stage: &str, message: impl Into<String>) {
        self.push(stage, Level::Warn, message.into());
    }

    fn push(&mut self, stage: &str, level: Level, message: String) {
        match level {
            Level::Debug => tracing::debug!(stage, "{message}"),
            Level::Info => tracing::info!(stage, "{message}"),
            Level::Warn => tracing::warn!(stage, "{message}"),
        }
        self.entries.push(Diagnostic {
            stage: stage.to_owned(),
            level,
            message,
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Entries emitted by one stage
    pub fn for_stage<'a>(&'a self, stage: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.entries.iter().filter(move |d| d.stage == stage)
    }

    /// Whether any entry of `stage` contains `needle`
    pub fn mentions(&self, stage: &str, needle: &str) -> bool {
        self.for_stage(stage).any(|d| d.message.contains(needle))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_keep_order_and_stage() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.info("validation", "Found 2 records where fgm > fga");
        diagnostics.warn("type_conversion", "Could not convert minutes value 'abc'");

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.entries()[0].stage, "validation");
        assert_eq!(diagnostics.entries()[1].level, Level::Warn);
        assert!(diagnostics.mentions("validation", "fgm > fga"));
        assert!(!diagnostics.mentions("validation", "minutes"));
    }
}
