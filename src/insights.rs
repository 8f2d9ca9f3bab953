//! Pattern-based observations over a user's cycle history.
//!
//! Each rule looks at the segmented cycles independently and contributes at
//! most one message. Rules only run once at least two cycles exist.

use chrono::Duration;

use crate::models::{Cycle, FlowLevel};
use crate::prediction::DEFAULT_CYCLE_LENGTH;

pub const KEEP_LOGGING: &str =
    "Keep logging your cycles! Insights will appear once we have data from at least two cycles.";
pub const NO_PATTERNS: &str =
    "Your cycles don't show a strong pattern yet. Keep logging daily to uncover more insights.";

const STABLE_SPREAD_DAYS: i64 = 3;
const LUTEAL_START_DAY: i64 = 16;
const LOW_MOOD_BELOW: u8 = 3;

/// Generate insight messages from cycles ordered newest first.
pub fn generate_insights(cycles: &[Cycle]) -> Vec<String> {
    if cycles.len() < 2 {
        return vec![KEEP_LOGGING.to_string()];
    }

    let rules: [fn(&[Cycle]) -> Option<String>; 5] = [
        stable_lengths,
        heavy_second_day,
        luteal_mood_dip,
        frequent_cramps,
        frequent_bloating,
    ];
    let insights: Vec<String> = rules.iter().filter_map(|rule| rule(cycles)).collect();

    if insights.is_empty() {
        return vec![NO_PATTERNS.to_string()];
    }
    insights
}

fn stable_lengths(cycles: &[Cycle]) -> Option<String> {
    if cycles.len() < 3 {
        return None;
    }
    // The newest cycle is usually still open, so three cycles give two lengths.
    let recent: Vec<i64> = cycles.iter().filter_map(|c| c.cycle_length).take(3).collect();
    if recent.len() < 2 {
        return None;
    }
    let min = *recent.iter().min()?;
    let max = *recent.iter().max()?;
    (max - min <= STABLE_SPREAD_DAYS).then(|| {
        format!(
            "Your cycle length has been stable, between {min} and {max} days over your recent cycles."
        )
    })
}

fn heavy_second_day(cycles: &[Cycle]) -> Option<String> {
    let count = cycles
        .iter()
        .filter(|c| {
            let day_two = c.start_date + Duration::days(1);
            c.logs
                .iter()
                .any(|l| l.date == day_two && l.flow == Some(FlowLevel::Heavy))
        })
        .count();
    (count >= 2).then(|| {
        format!("Your flow tends to be heaviest on day 2 of your period ({count} cycles so far).")
    })
}

fn luteal_mood_dip(cycles: &[Cycle]) -> Option<String> {
    let dips = cycles
        .iter()
        .filter(|c| {
            let length = c.cycle_length.unwrap_or(DEFAULT_CYCLE_LENGTH);
            c.logs.iter().any(|l| {
                let day = c.day_of(l.date);
                day > LUTEAL_START_DAY
                    && day < length
                    && l.mood.is_some_and(|m| m < LOW_MOOD_BELOW)
            })
        })
        .count();
    (ratio(dips, cycles.len()) > 0.5).then(|| {
        "Your mood often dips in the days before your period (luteal phase).".to_string()
    })
}

fn frequent_cramps(cycles: &[Cycle]) -> Option<String> {
    (symptom_ratio(cycles, "Cramps") > 0.6)
        .then(|| "Cramps show up in most of your cycles.".to_string())
}

fn frequent_bloating(cycles: &[Cycle]) -> Option<String> {
    (symptom_ratio(cycles, "Bloating") > 0.5)
        .then(|| "Bloating is a recurring symptom in more than half of your cycles.".to_string())
}

fn symptom_ratio(cycles: &[Cycle], symptom: &str) -> f64 {
    let hits = cycles.iter().filter(|c| c.symptoms.contains(symptom)).count();
    ratio(hits, cycles.len())
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64
}
