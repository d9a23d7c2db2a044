//! Typing sessions: key timing events for one recording of the prompt.

mod similarity;
mod validator;

pub use similarity::prompt_similarity;
pub(crate) use validator::timing_defect;
pub use validator::{SessionValidator, ValidatedSession, HARD_MIN_EVENTS, HARD_MIN_SIMILARITY};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// One key press: when it went down and when it came back up (milliseconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: String,
    pub down_ms: f64,
    pub up_ms: f64,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, down_ms: f64, up_ms: f64) -> Self {
        Self {
            key: key.into(),
            down_ms,
            up_ms,
        }
    }

    pub fn dwell_ms(&self) -> f64 {
        self.up_ms - self.down_ms
    }
}

/// A labeled recording of the prompt, events ordered by key-down time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub label: String,
    pub typed_text: String,
    pub events: Vec<KeyEvent>,
    pub recorded_at: DateTime<Utc>,
}

impl Session {
    pub fn new(label: impl Into<String>, typed_text: impl Into<String>, events: Vec<KeyEvent>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            label: label.into(),
            typed_text: typed_text.into(),
            events,
            recorded_at: Utc::now(),
        }
    }

    /// Build from separate down/up records as a capture surface emits them.
    pub fn from_raw(label: impl Into<String>, typed_text: impl Into<String>, raw: &[RawKeyEvent]) -> Self {
        let paired = pair_raw_events(raw);
        if paired.unmatched > 0 {
            tracing::debug!(unmatched = paired.unmatched, "dropped unpaired raw key events");
        }
        Self::new(label, typed_text, paired.events)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyAction {
    Down,
    Up,
}

/// A single keydown or keyup as recorded, timestamp relative to session start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawKeyEvent {
    pub key: String,
    #[serde(rename = "type")]
    pub action: KeyAction,
    pub t: f64,
}

#[derive(Debug, Clone, Default)]
pub struct PairedEvents {
    pub events: Vec<KeyEvent>,
    /// Downs never released plus ups with no pending down
    pub unmatched: usize,
}

/// Pair each key-up with the earliest pending key-down of the same key.
///
/// Raw records are stably sorted by timestamp first; records with non-finite timestamps are
/// counted as unmatched. The result is ordered by key-down time.
pub fn pair_raw_events(raw: &[RawKeyEvent]) -> PairedEvents {
    let mut ordered: Vec<&RawKeyEvent> = raw.iter().filter(|r| r.t.is_finite()).collect();
    let mut unmatched = raw.len() - ordered.len();
    ordered.sort_by(|a, b| a.t.total_cmp(&b.t));

    let mut pending: HashMap<&str, std::collections::VecDeque<f64>> = HashMap::new();
    let mut events = Vec::with_capacity(ordered.len() / 2);
    for r in ordered {
        match r.action {
            KeyAction::Down => pending.entry(r.key.as_str()).or_default().push_back(r.t),
            KeyAction::Up => match pending.get_mut(r.key.as_str()).and_then(|q| q.pop_front()) {
                Some(down) => events.push(KeyEvent::new(r.key.clone(), down, r.t)),
                None => unmatched += 1,
            },
        }
    }
    unmatched += pending.values().map(|q| q.len()).sum::<usize>();
    events.sort_by(|a, b| a.down_ms.total_cmp(&b.down_ms));

    PairedEvents { events, unmatched }
}

/// On-disk form of a captured session: either a full [`Session`] or the raw down/up stream
/// a capture surface records.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CaptureFile {
    Session(Session),
    Raw {
        #[serde(default)]
        label: Option<String>,
        typed_text: String,
        events: Vec<RawKeyEvent>,
    },
}

impl CaptureFile {
    /// `label` overrides whatever the file carries; raw captures without one get an empty label.
    pub fn into_session(self, label: Option<&str>) -> Session {
        match self {
            CaptureFile::Session(mut s) => {
                if let Some(l) = label {
                    s.label = l.to_string();
                }
                s
            }
            CaptureFile::Raw {
                label: file_label,
                typed_text,
                events,
            } => {
                let label = label.map(str::to_string).or(file_label).unwrap_or_default();
                Session::from_raw(label, typed_text, &events)
            }
        }
    }
}
