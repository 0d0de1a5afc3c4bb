//! Cosmetic progress stages for enhanced chat.
//!
//! These stages only drive a progress display. They are played on fixed
//! delays before the real request and say nothing about what the backend is
//! actually doing.

use super::model::EnhancedSettings;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnhancedStage {
    Initializing,
    SearchingFiles,
    Classifying,
    ProcessingLlm,
    SyncingCloud,
    Completed,
}

impl EnhancedStage {
    /// Progress label shown next to the stage.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Initializing => "Initializing enhanced chat...",
            Self::SearchingFiles => "Searching related files...",
            Self::Classifying => "Classifying files...",
            Self::ProcessingLlm => "Processing with AI...",
            Self::SyncingCloud => "Syncing metadata...",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for EnhancedStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How long each cosmetic stage is shown before moving on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagePacing {
    pub searching_files_ms: u64,
    pub classifying_ms: u64,
    pub processing_llm_ms: u64,
    pub syncing_cloud_ms: u64,
}

impl Default for StagePacing {
    fn default() -> Self {
        Self {
            searching_files_ms: 500,
            classifying_ms: 300,
            processing_llm_ms: 400,
            syncing_cloud_ms: 200,
        }
    }
}

impl StagePacing {
    /// No delays at all; every stage is shown and immediately left.
    pub fn instant() -> Self {
        Self {
            searching_files_ms: 0,
            classifying_ms: 0,
            processing_llm_ms: 0,
            syncing_cloud_ms: 0,
        }
    }

    /// The stages to play between `Initializing` and the real request, with
    /// their dwell times. `Classifying` and `SyncingCloud` are skipped when
    /// the matching setting is off.
    pub fn plan(&self, settings: &EnhancedSettings) -> Vec<(EnhancedStage, Duration)> {
        let mut plan = vec![(
            EnhancedStage::SearchingFiles,
            Duration::from_millis(self.searching_files_ms),
        )];
        if settings.include_classification {
            plan.push((
                EnhancedStage::Classifying,
                Duration::from_millis(self.classifying_ms),
            ));
        }
        plan.push((
            EnhancedStage::ProcessingLlm,
            Duration::from_millis(self.processing_llm_ms),
        ));
        if settings.include_cloud_metadata {
            plan.push((
                EnhancedStage::SyncingCloud,
                Duration::from_millis(self.syncing_cloud_ms),
            ));
        }
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stages(plan: &[(EnhancedStage, Duration)]) -> Vec<EnhancedStage> {
        plan.iter().map(|(stage, _)| *stage).collect()
    }

    #[test]
    fn full_plan_with_defaults() {
        let plan = StagePacing::default().plan(&EnhancedSettings::default());
        assert_eq!(
            stages(&plan),
            vec![
                EnhancedStage::SearchingFiles,
                EnhancedStage::Classifying,
                EnhancedStage::ProcessingLlm,
                EnhancedStage::SyncingCloud,
            ]
        );
        let total: Duration = plan.iter().map(|(_, d)| *d).sum();
        assert_eq!(total, Duration::from_millis(1400));
    }

    #[test]
    fn optional_stages_are_skipped() {
        let settings = EnhancedSettings {
            include_classification: false,
            include_cloud_metadata: false,
            ..Default::default()
        };
        let plan = StagePacing::instant().plan(&settings);
        assert_eq!(
            stages(&plan),
            vec![EnhancedStage::SearchingFiles, EnhancedStage::ProcessingLlm]
        );
    }

    #[test]
    fn stages_serialize_screaming() {
        let json = serde_json::to_string(&EnhancedStage::ProcessingLlm).unwrap();
        assert_eq!(json, "\"PROCESSING_LLM\"");
    }
}
