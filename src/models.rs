use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::log_store::LogStore;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlowLevel {
    Light,
    Medium,
    Heavy,
}

/// One day of user-entered health data. At most one per calendar date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyLog {
    pub date: NaiveDate,
    #[serde(default)]
    pub is_period_day: bool,
    #[serde(default)]
    pub symptoms: BTreeSet<String>,
    #[serde(default)]
    pub flow: Option<FlowLevel>,
    #[serde(default)]
    pub mood: Option<u8>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl DailyLog {
    /// An empty log for `date`: not a period day, nothing recorded.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            is_period_day: false,
            symptoms: BTreeSet::new(),
            flow: None,
            mood: None,
            notes: None,
        }
    }

    pub fn period(date: NaiveDate, flow: Option<FlowLevel>) -> Self {
        Self {
            is_period_day: true,
            flow,
            ..Self::new(date)
        }
    }

    pub fn with_mood(mut self, mood: u8) -> Self {
        self.mood = Some(mood);
        self
    }

    pub fn with_symptoms<I, S>(mut self, symptoms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symptoms.extend(symptoms.into_iter().map(Into::into));
        self
    }
}

/// A derived menstrual cycle. Never persisted; rebuilt from logs on demand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cycle {
    /// 1-based, oldest cycle = 1.
    pub index: usize,
    pub start_date: NaiveDate,
    /// Last day of the bleed that opened the cycle, not the end of the cycle.
    pub period_end_date: NaiveDate,
    pub period_duration: i64,
    /// `None` for the most recent cycle.
    pub cycle_length: Option<i64>,
    pub symptoms: BTreeSet<String>,
    pub logs: Vec<DailyLog>,
}

impl Cycle {
    /// 1-based day of the cycle that `date` falls on.
    pub fn day_of(&self, date: NaiveDate) -> i64 {
        (date - self.start_date).num_days() + 1
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CyclePhase {
    Menstrual,
    Follicular,
    Ovulation,
    Luteal,
    Unknown,
}

impl std::fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CyclePhase::Menstrual => "Menstrual",
            CyclePhase::Follicular => "Follicular",
            CyclePhase::Ovulation => "Ovulation",
            CyclePhase::Luteal => "Luteal",
            CyclePhase::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prediction {
    pub predicted_start: NaiveDate,
    pub predicted_end: NaiveDate,
    pub confidence: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FertilityWindow {
    pub fertile_start: NaiveDate,
    pub fertile_end: NaiveDate,
    pub ovulation_day: NaiveDate,
    pub peak_start: NaiveDate,
    pub peak_end: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CycleStats {
    pub total_cycles: usize,
    pub avg_cycle_length: Option<f32>,
    pub avg_period_length: Option<f32>,
    pub shortest_cycle: Option<i64>,
    pub longest_cycle: Option<i64>,
    pub last_period_start: Option<NaiveDate>,
    pub last_period_end: Option<NaiveDate>,
}

/// Everything the presentation layer needs, recomputed from one log snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleSnapshot {
    pub today: NaiveDate,
    pub cycles: Vec<Cycle>,
    pub average_cycle_length: i64,
    pub current_cycle_day: Option<i64>,
    pub current_phase: CyclePhase,
    pub next_period_date: Option<NaiveDate>,
    pub insights: Vec<String>,
    pub prediction: Option<Prediction>,
    pub fertility: Option<FertilityWindow>,
    pub stats: CycleStats,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(default)]
    pub logs: LogStore,
    #[serde(default)]
    pub settings: AppSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppSettings {
    pub auto_lock_minutes: u32,
    #[serde(default)]
    pub show_fertility: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            auto_lock_minutes: 5,
            show_fertility: false,
        }
    }
}

/// Data returned for a calendar month view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthData {
    pub year: i32,
    pub month: u32,
    pub logs: Vec<DailyLog>,
    pub prediction: Option<Prediction>,
    pub fertility: Option<FertilityWindow>,
    pub current_cycle: Option<Cycle>,
    pub stats: CycleStats,
}
