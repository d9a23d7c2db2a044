//! Synthetic typing sessions with controllable timing distributions.

#![allow(dead_code)]

use keystyle::config::DEFAULT_PROMPT;
use keystyle::features::FeatureExtractor;
use keystyle::{Dataset, KeyEvent, Session};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub const PROMPT: &str = DEFAULT_PROMPT;

/// Timing profile of one synthetic typist (milliseconds, uniform ± jitter).
#[derive(Debug, Clone, Copy)]
pub struct Typist {
    pub dwell: f64,
    pub dwell_jitter: f64,
    pub flight: f64,
    pub flight_jitter: f64,
}

/// Short, quick presses
pub const FAST: Typist = Typist {
    dwell: 80.0,
    dwell_jitter: 5.0,
    flight: 110.0,
    flight_jitter: 10.0,
};

/// Long, slow presses
pub const SLOW: Typist = Typist {
    dwell: 150.0,
    dwell_jitter: 5.0,
    flight: 160.0,
    flight_jitter: 10.0,
};

pub fn session(label: &str, typist: Typist, rng: &mut ChaCha8Rng) -> Session {
    let mut t = 0.0;
    let events = PROMPT
        .chars()
        .map(|c| {
            let dwell = typist.dwell + rng.gen_range(-typist.dwell_jitter..=typist.dwell_jitter);
            let e = KeyEvent::new(c.to_string(), t, t + dwell);
            t += typist.flight + rng.gen_range(-typist.flight_jitter..=typist.flight_jitter);
            e
        })
        .collect();
    Session::new(label, PROMPT, events)
}

pub fn sessions(label: &str, typist: Typist, n: usize, seed: u64) -> Vec<Session> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n).map(|_| session(label, typist, &mut rng)).collect()
}

/// Dataset with `n` vectors per (label, typist) entry.
pub fn dataset(entries: &[(&str, Typist, usize)]) -> Dataset {
    let extractor = FeatureExtractor::new();
    let mut ds = Dataset::new(extractor.schema().clone());
    for (i, (label, typist, n)) in entries.iter().enumerate() {
        for s in sessions(label, *typist, *n, 1000 + i as u64) {
            ds.insert(*label, extractor.extract(&s).expect("synthetic session extracts"));
        }
    }
    ds
}

/// Session from (down, up) pairs typed as the full prompt.
pub fn timed(label: &str, timings: &[(f64, f64)]) -> Session {
    let events = timings
        .iter()
        .enumerate()
        .map(|(i, &(down, up))| KeyEvent::new(format!("k{}", i), down, up))
        .collect();
    Session::new(label, PROMPT, events)
}
