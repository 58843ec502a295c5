use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SyncOutcome {
    Success,
    Error,
}

/// Health record of the most recent pass (singleton)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncStatus {
    pub outcome: SyncOutcome,
    pub timestamp: DateTime<Utc>,
    pub server_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub entries: usize,
    #[serde(default)]
    pub available: usize,
    #[serde(default)]
    pub newly_available: usize,
}

impl SyncStatus {
    pub fn success(server_name: impl Into<String>, entries: usize, available: usize, newly_available: usize) -> Self {
        Self {
            outcome: SyncOutcome::Success,
            timestamp: Utc::now(),
            server_name: server_name.into(),
            error: None,
            entries,
            available,
            newly_available,
        }
    }

    pub fn error(server_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            outcome: SyncOutcome::Error,
            timestamp: Utc::now(),
            server_name: server_name.into(),
            error: Some(detail.into()),
            entries: 0,
            available: 0,
            newly_available: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == SyncOutcome::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_carries_detail() {
        let status = SyncStatus::error("Navidad", "disk full");
        assert!(!status.is_success());
        assert_eq!(status.error.as_deref(), Some("disk full"));
        assert_eq!(status.server_name, "Navidad");
    }

    #[test]
    fn test_status_json_shape() {
        let status = SyncStatus::success("Navidad", 3, 2, 1);
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["outcome"], "success");
        assert!(json.get("error").is_none());
        assert_eq!(json["newly_available"], 1);
    }
}
