//! Per-provider failure reasons collected while walking a fallback chain.

use serde::Serialize;
use std::fmt;

/// Ordered `provider -> reason` map.
///
/// Entries keep their first insertion position; recording the same provider
/// again replaces its reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProviderDiagnostics {
    entries: Vec<(String, String)>,
}

impl ProviderDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record why `provider` could not be initialized.
    pub fn record(&mut self, provider: impl Into<String>, reason: impl Into<String>) {
        let provider = provider.into();
        let reason = reason.into();

        match self.entries.iter_mut().find(|(name, _)| *name == provider) {
            Some(entry) => entry.1 = reason,
            None => self.entries.push((provider, reason)),
        }
    }

    /// Reason recorded for `provider`, if any.
    pub fn get(&self, provider: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == provider)
            .map(|(_, reason)| reason.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, reason)| (name.as_str(), reason.as_str()))
    }
}

impl fmt::Display for ProviderDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let details: Vec<String> = self
            .iter()
            .map(|(name, reason)| format!("{}: {}", name, reason))
            .collect();
        write!(f, "{}", details.join("; "))
    }
}
