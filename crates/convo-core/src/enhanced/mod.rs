//! Enhanced chat domain module.
//!
//! - `model`: settings, request, result and history types
//! - `stage`: cosmetic progress stages and their pacing

mod model;
mod stage;

pub use model::{
    EnhancedRecord, EnhancedRequest, EnhancedResult, EnhancedSettings, EnhancedSettingsUpdate,
    EnhancedStats,
};
pub use stage::{EnhancedStage, StagePacing};
