//! Lunara: cycle analytics for a women's-health companion.
//!
//! The core turns a user's ascending daily logs into menstrual cycles
//! ([`segment_cycles`]), derives metrics and predictions ([`prediction`]) and
//! pattern-based observations ([`generate_insights`]). [`recompute`] bundles
//! all of it into one [`CycleSnapshot`]. Those functions are pure and total.
//!
//! Around the core sit the collaborators an on-device app needs: a validated
//! [`LogStore`], an encrypted [`Vault`], a [`Tracker`] session and a seam to
//! a generative text service ([`assistant`]).

pub mod assistant;
pub mod config;
pub mod crypto;
pub mod error;
pub mod insights;
pub mod log_store;
pub mod models;
pub mod prediction;
pub mod segmenter;
pub mod snapshot;
pub mod storage;
pub mod tracker;

pub use assistant::{assistant_insights, build_insight_prompt, AssistantError, TextGenerator};
pub use config::VaultConfig;
pub use error::{Error, Result};
pub use insights::generate_insights;
pub use log_store::{LogStore, ValidationError};
pub use models::{
    AppData, AppSettings, Cycle, CyclePhase, CycleSnapshot, CycleStats, DailyLog,
    FertilityWindow, FlowLevel, MonthData, Prediction,
};
pub use segmenter::segment_cycles;
pub use snapshot::recompute;
pub use storage::{StorageError, Vault};
pub use tracker::Tracker;
