//! Acceptance gate for captured sessions: prompt match, event count, timing integrity.

use super::{prompt_similarity, KeyEvent, Session};
use crate::config::ValidationConfig;
use crate::error::ValidationError;
use std::ops::Deref;

/// Flight features need two key-downs; configuration cannot go lower.
pub const HARD_MIN_EVENTS: usize = 2;

/// Prompt similarity floor; configuration can only raise it.
pub const HARD_MIN_SIMILARITY: f64 = 0.8;

/// A session that passed [`SessionValidator::validate`]. Only the validator constructs one.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSession(Session);

impl Deref for ValidatedSession {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.0
    }
}

pub struct SessionValidator {
    prompt: String,
    min_similarity: f64,
    min_events: usize,
}

impl SessionValidator {
    pub fn new(prompt: impl Into<String>, config: &ValidationConfig) -> Self {
        Self {
            prompt: prompt.into(),
            min_similarity: config.min_similarity.max(HARD_MIN_SIMILARITY),
            min_events: config.min_events.max(HARD_MIN_EVENTS),
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Prompt similarity is checked first, then event count, then per-event timing.
    pub fn validate(&self, session: Session) -> Result<ValidatedSession, ValidationError> {
        let similarity = if self.prompt.trim().is_empty() {
            0.0
        } else {
            prompt_similarity(&session.typed_text, &self.prompt)
        };
        if similarity < self.min_similarity {
            return Err(ValidationError::PromptMismatch {
                similarity,
                required: self.min_similarity,
            });
        }

        if session.events.len() < self.min_events {
            return Err(ValidationError::TooFewEvents {
                have: session.events.len(),
                need: self.min_events,
            });
        }

        check_timing(&session)?;
        Ok(ValidatedSession(session))
    }
}

fn check_timing(session: &Session) -> Result<(), ValidationError> {
    match timing_defect(&session.events) {
        Some((index, reason)) => Err(ValidationError::MalformedEvents { index, reason }),
        None => Ok(()),
    }
}

/// First event with a non-finite timestamp, a release before its press, or a press before
/// the previous one.
pub(crate) fn timing_defect(events: &[KeyEvent]) -> Option<(usize, String)> {
    let mut last_down = f64::NEG_INFINITY;
    for (index, e) in events.iter().enumerate() {
        let reason = if !e.down_ms.is_finite() || !e.up_ms.is_finite() {
            Some("timestamp is not finite".to_string())
        } else if e.up_ms < e.down_ms {
            Some(format!("released at {} before pressed at {}", e.up_ms, e.down_ms))
        } else if e.down_ms < last_down {
            Some(format!("pressed at {} before previous key at {}", e.down_ms, last_down))
        } else {
            None
        };
        if reason.is_some() {
            return reason.map(|r| (index, r));
        }
        last_down = e.down_ms;
    }
    None
}
