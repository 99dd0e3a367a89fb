//! Test doubles for code that depends on a [`Scorer`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use sentinel_common::Result;

use crate::scorer::Scorer;

enum Reply {
    Constant(f64),
    PerItem(Vec<f64>),
}

/// Scorer that returns canned probabilities and records what it was asked.
///
/// `constant` answers every text with the same value; `per_item` returns the
/// given vector verbatim regardless of batch size, which lets tests provoke
/// length mismatches.
pub struct FixedScorer {
    reply: Reply,
    calls: AtomicUsize,
    last_input: Mutex<Vec<String>>,
}

impl FixedScorer {
    pub fn constant(probability: f64) -> Self {
        Self::with_reply(Reply::Constant(probability))
    }

    pub fn per_item(probabilities: Vec<f64>) -> Self {
        Self::with_reply(Reply::PerItem(probabilities))
    }

    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            last_input: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_input(&self) -> Vec<String> {
        self.last_input
            .lock()
            .map(|input| input.clone())
            .unwrap_or_default()
    }
}

impl Scorer for FixedScorer {
    fn score(&self, texts: &[String]) -> Result<Vec<f64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_input.lock() {
            *last = texts.to_vec();
        }
        Ok(match &self.reply {
            Reply::Constant(p) => vec![*p; texts.len()],
            Reply::PerItem(ps) => ps.clone(),
        })
    }

    fn name(&self) -> &str {
        "fixed"
    }
}
