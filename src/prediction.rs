use chrono::{Duration, NaiveDate};

use crate::models::{Cycle, CyclePhase, CycleStats, FertilityWindow, Prediction};

/// Used until two period starts have been observed.
pub const DEFAULT_CYCLE_LENGTH: i64 = 28;
/// Used for the predicted period end when no bleed has been observed.
pub const DEFAULT_PERIOD_LENGTH: i64 = 5;

const AVERAGE_WINDOW: usize = 3;
const CONFIDENCE_WINDOW: usize = 6;

// All functions here take cycles newest first, as produced by
// `segment_cycles`, and never fail: missing data maps to a sentinel.

/// Rounded mean of the up-to-3 most recent completed cycle lengths.
pub fn average_cycle_length(cycles: &[Cycle]) -> i64 {
    let recent = completed_lengths(cycles, AVERAGE_WINDOW);
    if recent.is_empty() {
        return DEFAULT_CYCLE_LENGTH;
    }
    mean(&recent).round() as i64
}

pub fn last_period_start(cycles: &[Cycle]) -> Option<NaiveDate> {
    cycles.first().map(|c| c.start_date)
}

/// 1-based day of the current cycle as of `today`.
pub fn current_cycle_day(cycles: &[Cycle], today: NaiveDate) -> Option<i64> {
    last_period_start(cycles).map(|start| (today - start).num_days() + 1)
}

pub fn next_period_date(cycles: &[Cycle]) -> Option<NaiveDate> {
    last_period_start(cycles).map(|start| start + Duration::days(average_cycle_length(cycles)))
}

/// Fixed-threshold phase lookup. Only the luteal upper bound follows the
/// user's average length; the other boundaries are population defaults.
pub fn current_phase(cycle_day: Option<i64>, average_length: i64) -> CyclePhase {
    let Some(day) = cycle_day else {
        return CyclePhase::Unknown;
    };
    if day > average_length {
        return CyclePhase::Unknown;
    }
    match day {
        1..=5 => CyclePhase::Menstrual,
        6..=13 => CyclePhase::Follicular,
        14..=16 => CyclePhase::Ovulation,
        d if d >= 17 => CyclePhase::Luteal,
        _ => CyclePhase::Unknown,
    }
}

/// Predict the next period, including its expected length and a confidence
/// derived from how regular recent cycles have been.
pub fn predict(cycles: &[Cycle]) -> Option<Prediction> {
    let predicted_start = next_period_date(cycles)?;

    let durations: Vec<f64> = cycles
        .iter()
        .take(AVERAGE_WINDOW)
        .map(|c| c.period_duration as f64)
        .collect();
    let avg_period = if durations.is_empty() {
        DEFAULT_PERIOD_LENGTH
    } else {
        mean(&durations).round() as i64
    };
    let predicted_end = predicted_start + Duration::days((avg_period - 1).max(0));

    let lengths = completed_lengths(cycles, CONFIDENCE_WINDOW);
    let confidence = if lengths.len() < 2 {
        0.5
    } else {
        let std_dev = std_deviation(&lengths);
        (1.0 - (std_dev / mean(&lengths)) as f32).clamp(0.1, 0.95)
    };

    Some(Prediction {
        predicted_start,
        predicted_end,
        confidence,
    })
}

/// Estimate the fertility window based on predicted next period.
/// Ovulation ~14 days before next period. Fertile window = ovulation - 5 to ovulation day.
/// Peak fertility = ovulation - 2 to ovulation day.
pub fn fertility_window(cycles: &[Cycle]) -> Option<FertilityWindow> {
    let prediction = predict(cycles)?;

    let ovulation_day = prediction.predicted_start - Duration::days(14);

    Some(FertilityWindow {
        fertile_start: ovulation_day - Duration::days(5),
        fertile_end: ovulation_day,
        ovulation_day,
        peak_start: ovulation_day - Duration::days(2),
        peak_end: ovulation_day,
    })
}

/// Compute cycle statistics for the stats view.
pub fn cycle_stats(cycles: &[Cycle]) -> CycleStats {
    let Some(latest) = cycles.first() else {
        return CycleStats::default();
    };

    let lengths: Vec<i64> = cycles.iter().filter_map(|c| c.cycle_length).collect();
    let durations: Vec<f64> = cycles.iter().map(|c| c.period_duration as f64).collect();

    CycleStats {
        total_cycles: cycles.len(),
        avg_cycle_length: if lengths.is_empty() {
            None
        } else {
            Some(lengths.iter().sum::<i64>() as f32 / lengths.len() as f32)
        },
        avg_period_length: Some(mean(&durations) as f32),
        shortest_cycle: lengths.iter().copied().min(),
        longest_cycle: lengths.iter().copied().max(),
        last_period_start: Some(latest.start_date),
        last_period_end: Some(latest.period_end_date),
    }
}

fn completed_lengths(cycles: &[Cycle], limit: usize) -> Vec<f64> {
    cycles
        .iter()
        .filter_map(|c| c.cycle_length)
        .take(limit)
        .map(|len| len as f64)
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_deviation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = mean(values);
    let variance =
        values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
