//! Seam to a generative text service for conversational insights.
//!
//! The service is treated as an opaque prompt-to-text function. When it
//! fails or returns nothing usable, the heuristic insights are used instead.

use std::fmt::Write;

use crate::models::CycleSnapshot;

const RECENT_CYCLES_IN_PROMPT: usize = 6;

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("text service unavailable: {0}")]
    Unavailable(String),
    #[error("text service rejected the prompt: {0}")]
    Rejected(String),
}

/// A prompt-in, text-out generation backend.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, AssistantError>;
}

/// Render the cycle context the text service sees.
pub fn build_insight_prompt(snapshot: &CycleSnapshot) -> String {
    let mut prompt = String::from(
        "You are a supportive women's-health companion. Using the cycle summary below, \
         write up to three short, friendly observations, one per line. \
         Do not give medical diagnoses.\n\n",
    );

    // Writing to a String cannot fail.
    let _ = writeln!(prompt, "Today: {}", snapshot.today);
    let _ = writeln!(prompt, "Cycles logged: {}", snapshot.cycles.len());
    let _ = writeln!(
        prompt,
        "Average cycle length: {} days",
        snapshot.average_cycle_length
    );
    match snapshot.current_cycle_day {
        Some(day) => {
            let _ = writeln!(prompt, "Current cycle day: {day} ({})", snapshot.current_phase);
        }
        None => {
            let _ = writeln!(prompt, "Current cycle day: unknown");
        }
    }
    if let Some(next) = snapshot.next_period_date {
        let _ = writeln!(prompt, "Next period expected: {next}");
    }

    if !snapshot.cycles.is_empty() {
        prompt.push_str("\nRecent cycles (newest first):\n");
        for cycle in snapshot.cycles.iter().take(RECENT_CYCLES_IN_PROMPT) {
            let length = cycle
                .cycle_length
                .map(|l| format!("{l} days"))
                .unwrap_or_else(|| "ongoing".to_string());
            let symptoms = if cycle.symptoms.is_empty() {
                "none".to_string()
            } else {
                cycle.symptoms.iter().cloned().collect::<Vec<_>>().join(", ")
            };
            let _ = writeln!(
                prompt,
                "- #{} started {}, bled {} days, length {}, symptoms: {}",
                cycle.index, cycle.start_date, cycle.period_duration, length, symptoms
            );
        }
    }

    prompt.push_str("\nDetected patterns:\n");
    for insight in &snapshot.insights {
        let _ = writeln!(prompt, "- {insight}");
    }
    prompt
}

/// Ask the text service for insights, falling back to the heuristic ones.
pub fn assistant_insights(generator: &dyn TextGenerator, snapshot: &CycleSnapshot) -> Vec<String> {
    let prompt = build_insight_prompt(snapshot);
    match generator.generate(&prompt) {
        Ok(text) => {
            let lines: Vec<String> = text
                .lines()
                .map(|l| l.trim().trim_start_matches(['-', '*']).trim())
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect();
            if lines.is_empty() {
                tracing::warn!("text service returned no content; using heuristic insights");
                return snapshot.insights.clone();
            }
            lines
        }
        Err(e) => {
            tracing::warn!(error = %e, "text service failed; using heuristic insights");
            snapshot.insights.clone()
        }
    }
}
