//! Per-reference outcome of a batch load.

use serde::Serialize;

use crate::domain::entities::UrlKind;

/// How one reference settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadStatus {
    /// A handle is available.
    Loaded {
        /// Human readable handle summary.
        handle: String,
    },
    /// No usable image (cached miss).
    Missing,
    /// The fetch failed hard.
    Failed {
        /// Error message.
        error: String,
    },
}

impl LoadStatus {
    /// Returns true if a handle was produced.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}

/// Report line for one requested reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Reference as given.
    pub raw: String,
    /// Canonical cache key.
    pub key: String,
    /// Classification of the reference.
    pub kind: String,
    /// Outcome.
    #[serde(flatten)]
    pub status: LoadStatus,
}

impl LoadReport {
    /// Creates a report line.
    #[must_use]
    pub fn new(raw: impl Into<String>, key: impl Into<String>, kind: UrlKind, status: LoadStatus) -> Self {
        Self {
            raw: raw.into(),
            key: key.into(),
            kind: kind.to_string(),
            status,
        }
    }
}

impl std::fmt::Display for LoadReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.status {
            LoadStatus::Loaded { handle } => write!(f, "ok      {} [{}] {handle}", self.key, self.kind),
            LoadStatus::Missing => write!(f, "missing {} [{}]", self.key, self.kind),
            LoadStatus::Failed { error } => write!(f, "failed  {} [{}] {error}", self.key, self.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let report = LoadReport::new(
            "/img/a",
            "http://host/img/a",
            UrlKind::LocalUpload,
            LoadStatus::Loaded {
                handle: "blob:cinevault/1".into(),
            },
        );

        let json = serde_json::to_value(&report).expect("serializes");
        assert_eq!(json["status"], "loaded");
        assert_eq!(json["handle"], "blob:cinevault/1");
        assert_eq!(json["kind"], "local");
    }

    #[test]
    fn test_display_missing() {
        let report = LoadReport::new("/x", "http://host/x", UrlKind::LocalUpload, LoadStatus::Missing);
        assert!(report.to_string().starts_with("missing http://host/x"));
        assert!(!report.status.is_loaded());
    }
}
