//! Token accounting across a run.

use std::sync::Mutex;

use serde_json::{json, Value};

use super::ModelUsage;

/// Accumulates usage across every model invocation under one origin.
///
/// The run context reports the totals through a framework message when its
/// turn completes.
#[derive(Default)]
pub struct TokenCounter {
    totals: Mutex<Totals>,
}

#[derive(Clone, Copy, Default)]
struct Totals {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
    successful_requests: u64,
}

impl TokenCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, usage: &ModelUsage) {
        let mut totals = self.totals.lock().unwrap_or_else(|e| e.into_inner());
        totals.prompt_tokens += u64::from(usage.prompt_tokens);
        totals.completion_tokens += u64::from(usage.completion_tokens);
        totals.total_tokens += u64::from(usage.total_tokens);
        totals.successful_requests += 1;
    }

    /// True when at least one invocation reported usage.
    pub fn counted_anything(&self) -> bool {
        self.totals
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .successful_requests
            > 0
    }

    /// The accumulated totals as the structure of a framework message.
    pub fn report(&self) -> Value {
        let totals = *self.totals.lock().unwrap_or_else(|e| e.into_inner());
        json!({
            "token_accounting": {
                "prompt_tokens": totals.prompt_tokens,
                "completion_tokens": totals.completion_tokens,
                "total_tokens": totals.total_tokens,
                "successful_requests": totals.successful_requests,
            }
        })
    }
}
