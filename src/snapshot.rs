use chrono::NaiveDate;

use crate::insights::generate_insights;
use crate::models::{CycleSnapshot, DailyLog};
use crate::prediction;
use crate::segmenter::segment_cycles;

/// Recompute every derived view from one ascending log snapshot.
///
/// Callers re-invoke this after each change to the log store; nothing is
/// cached between calls.
pub fn recompute(logs: &[DailyLog], today: NaiveDate, include_fertility: bool) -> CycleSnapshot {
    let cycles = segment_cycles(logs);

    let average_cycle_length = prediction::average_cycle_length(&cycles);
    let current_cycle_day = prediction::current_cycle_day(&cycles, today);
    let current_phase = prediction::current_phase(current_cycle_day, average_cycle_length);
    let fertility = if include_fertility {
        prediction::fertility_window(&cycles)
    } else {
        None
    };

    CycleSnapshot {
        today,
        average_cycle_length,
        current_cycle_day,
        current_phase,
        next_period_date: prediction::next_period_date(&cycles),
        insights: generate_insights(&cycles),
        prediction: prediction::predict(&cycles),
        fertility,
        stats: prediction::cycle_stats(&cycles),
        cycles,
    }
}
