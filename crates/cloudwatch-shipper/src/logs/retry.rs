// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Retry policy for listener requests.
//!
//! Delivery of one record walks a small state machine:
//!
//! ```text
//!   Attempt(1) ──retryable──> Backoff(2s) ──> Attempt(2) ──retryable──> Backoff(4s) ...
//!       │                                         │
//!       └──terminal status──> Terminal <──────────┴── attempts exhausted
//! ```
//!
//! Sleeping goes through [`Sleeper`] so tests never wait on the wall clock.

use std::time::Duration;

use async_trait::async_trait;

pub const MAX_ATTEMPTS: u32 = 4;
pub const INITIAL_BACKOFF: Duration = Duration::from_secs(2);

/// Statuses that end the retry loop, whether they mean success or not.
pub const TERMINAL_STATUSES: [u16; 5] = [200, 400, 401, 403, 404];

/// What a single request to the listener produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptResult {
    Status(u16),
    /// No response at all (connect error, timeout, reset).
    TransportFailure,
}

impl AttemptResult {
    #[must_use]
    pub fn is_success(self) -> bool {
        self == AttemptResult::Status(200)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Attempt(u32),
    Backoff { next_attempt: u32, delay: Duration },
    Terminal { attempts: u32, last: AttemptResult },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            initial_backoff: INITIAL_BACKOFF,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn should_retry(result: AttemptResult) -> bool {
        match result {
            AttemptResult::Status(status) => !TERMINAL_STATUSES.contains(&status),
            AttemptResult::TransportFailure => true,
        }
    }

    /// Delay before the attempt following `attempt` (1-based).
    #[must_use]
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2_u32.saturating_pow(attempt.saturating_sub(1)))
    }

    /// Next state once `attempt` finished with `result`.
    #[must_use]
    pub fn on_result(&self, attempt: u32, result: AttemptResult) -> RetryState {
        if !Self::should_retry(result) || attempt >= self.max_attempts {
            return RetryState::Terminal {
                attempts: attempt,
                last: result,
            };
        }
        RetryState::Backoff {
            next_attempt: attempt + 1,
            delay: self.backoff_after(attempt),
        }
    }
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
