//! Enhanced chat models.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// User-tunable options for enhanced chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancedSettings {
    /// Search the user's files for context.
    pub search_files: bool,
    /// Classify matched files.
    pub include_classification: bool,
    /// Sync classification metadata to the cloud store.
    pub include_cloud_metadata: bool,
    /// Upper bound on file results shown.
    pub max_results: u32,
}

impl Default for EnhancedSettings {
    fn default() -> Self {
        Self {
            search_files: true,
            include_classification: true,
            include_cloud_metadata: true,
            max_results: 5,
        }
    }
}

impl EnhancedSettings {
    /// Merges the fields present in `update`, leaving the others untouched.
    pub fn apply(&mut self, update: &EnhancedSettingsUpdate) {
        if let Some(v) = update.search_files {
            self.search_files = v;
        }
        if let Some(v) = update.include_classification {
            self.include_classification = v;
        }
        if let Some(v) = update.include_cloud_metadata {
            self.include_cloud_metadata = v;
        }
        if let Some(v) = update.max_results {
            self.max_results = v;
        }
    }
}

/// A partial settings change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhancedSettingsUpdate {
    pub search_files: Option<bool>,
    pub include_classification: Option<bool>,
    pub include_cloud_metadata: Option<bool>,
    pub max_results: Option<u32>,
}

/// Body of an enhanced chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhancedRequest {
    pub message: String,
    pub search_files: bool,
    pub include_classification: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl EnhancedRequest {
    pub fn new(message: impl Into<String>, settings: &EnhancedSettings) -> Self {
        Self {
            message: message.into(),
            search_files: settings.search_files,
            include_classification: settings.include_classification,
            session_id: None,
        }
    }

    pub fn with_session(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id;
        self
    }
}

/// A successful enhanced chat round trip.
///
/// `payload` holds the backend's search, classification and reasoning data
/// unchanged; the client only reads `text` from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedResult {
    /// Milliseconds since the Unix epoch when the result was produced.
    pub id: i64,
    pub message: String,
    pub session_id: Option<String>,
    pub timestamp: String,
    pub text: String,
    pub payload: Value,
}

/// One entry of the enhanced chat history, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedRecord {
    pub message: String,
    pub session_id: Option<String>,
    pub timestamp: String,
    /// Wall time from start of processing to final outcome, cosmetic stages included.
    pub processing_time_ms: u64,
    /// Backend attempts made, retries included.
    pub attempts: u32,
    pub result: Option<EnhancedResult>,
    pub error: Option<String>,
}

impl EnhancedRecord {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregates over the enhanced chat history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnhancedStats {
    pub total: usize,
    pub successful: usize,
    /// Percentage in `0.0..=100.0`.
    pub success_rate: f64,
    pub avg_processing_time_ms: u64,
    pub last_used: Option<String>,
}

impl EnhancedStats {
    /// Computes stats over `history`; `last_used` comes from the latest
    /// successful result.
    pub fn from_history<'a>(
        history: impl IntoIterator<Item = &'a EnhancedRecord>,
        last_result: Option<&EnhancedResult>,
    ) -> Self {
        let mut total = 0usize;
        let mut successful = 0usize;
        let mut time_sum = 0u64;
        for record in history {
            total += 1;
            if record.is_success() {
                successful += 1;
            }
            time_sum += record.processing_time_ms;
        }

        let (success_rate, avg_processing_time_ms) = if total > 0 {
            (
                successful as f64 / total as f64 * 100.0,
                (time_sum as f64 / total as f64).round() as u64,
            )
        } else {
            (0.0, 0)
        };

        Self {
            total,
            successful,
            success_rate,
            avg_processing_time_ms,
            last_used: last_result.map(|r| r.timestamp.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ms: u64, error: Option<&str>) -> EnhancedRecord {
        EnhancedRecord {
            message: "q".into(),
            session_id: None,
            timestamp: "2024-01-01T00:00:00Z".into(),
            processing_time_ms: ms,
            attempts: 1,
            result: None,
            error: error.map(String::from),
        }
    }

    #[test]
    fn partial_update_keeps_other_fields() {
        let mut settings = EnhancedSettings::default();
        settings.apply(&EnhancedSettingsUpdate {
            include_classification: Some(false),
            ..Default::default()
        });
        assert!(settings.search_files);
        assert!(!settings.include_classification);
        assert!(settings.include_cloud_metadata);
        assert_eq!(settings.max_results, 5);
    }

    #[test]
    fn request_omits_missing_session_id() {
        let request = EnhancedRequest::new("find report", &EnhancedSettings::default());
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("session_id").is_none());
        assert_eq!(json["search_files"], true);
        assert_eq!(json["include_classification"], true);
    }

    #[test]
    fn stats_over_mixed_history() {
        let history = vec![record(1000, None), record(2000, Some("boom")), record(3001, None)];
        let stats = EnhancedStats::from_history(&history, None);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.successful, 2);
        assert!((stats.success_rate - 66.666).abs() < 0.01);
        assert_eq!(stats.avg_processing_time_ms, 2000);
        assert_eq!(stats.last_used, None);
    }

    #[test]
    fn stats_over_empty_history() {
        let history: Vec<EnhancedRecord> = Vec::new();
        let stats = EnhancedStats::from_history(&history, None);
        assert_eq!(stats, EnhancedStats::default());
    }
}
