use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::models::{Cycle, DailyLog};

/// A period start closer than this to the previous accepted start is treated
/// as spotting within the same cycle.
pub const MIN_CYCLE_SPACING_DAYS: i64 = 10;

/// Split ascending daily logs into cycles, newest first.
///
/// `logs` must be sorted by date with one entry per date; this function does
/// not sort.
pub fn segment_cycles(logs: &[DailyLog]) -> Vec<Cycle> {
    let starts = accepted_starts(logs);

    let mut cycles: Vec<Cycle> = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(logs.len());
        let window = &logs[start..end];

        if !window.iter().any(|l| l.is_period_day) {
            continue;
        }

        let start_date = logs[start].date;
        let period_end_date = period_run_end(window);
        let symptoms: BTreeSet<String> = window
            .iter()
            .flat_map(|l| l.symptoms.iter().cloned())
            .collect();
        let cycle_length = starts
            .get(i + 1)
            .map(|&next| (logs[next].date - start_date).num_days());

        cycles.push(Cycle {
            index: cycles.len() + 1,
            start_date,
            period_end_date,
            period_duration: (period_end_date - start_date).num_days() + 1,
            cycle_length,
            symptoms,
            logs: window.to_vec(),
        });
    }

    tracing::debug!(logs = logs.len(), cycles = cycles.len(), "segmented cycles");

    cycles.reverse();
    cycles
}

/// Positions in `logs` of every accepted period start, oldest first.
pub(crate) fn accepted_starts(logs: &[DailyLog]) -> Vec<usize> {
    let mut starts: Vec<usize> = Vec::new();
    let mut last_accepted: Option<NaiveDate> = None;

    for (i, log) in logs.iter().enumerate() {
        if !is_period_start(logs, i) {
            continue;
        }
        let spaced = last_accepted
            .map(|prev| (log.date - prev).num_days() >= MIN_CYCLE_SPACING_DAYS)
            .unwrap_or(true);
        if spaced {
            starts.push(i);
            last_accepted = Some(log.date);
        }
    }

    starts
}

/// A period day whose predecessor (by position) is missing, not a period
/// day, or more than one calendar day earlier.
fn is_period_start(logs: &[DailyLog], i: usize) -> bool {
    let log = &logs[i];
    if !log.is_period_day {
        return false;
    }
    match i.checked_sub(1).map(|p| &logs[p]) {
        None => true,
        Some(prev) => !prev.is_period_day || (log.date - prev.date).num_days() > 1,
    }
}

/// Last date of the calendar-contiguous period run opening `window`.
fn period_run_end(window: &[DailyLog]) -> NaiveDate {
    let mut end = window[0].date;
    for log in &window[1..] {
        if !log.is_period_day || (log.date - end).num_days() > 1 {
            break;
        }
        end = log.date;
    }
    end
}
