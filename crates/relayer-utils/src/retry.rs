// Copyright 2022 Webb Technologies Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Retry logic for async calls

use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff;
use rand::Rng;

use crate::probe;

/// Constant with Max Retry Count is a backoff policy which always returns
/// a constant duration (plus an optional random jitter), until it exceeds
/// the maximum retry count.
#[derive(Debug)]
pub struct ConstantWithMaxRetryCount {
    interval: Duration,
    jitter: Duration,
    max_retry_count: usize,
    count: usize,
}

impl ConstantWithMaxRetryCount {
    /// Creates a new Constant backoff with `interval` and `max_retry_count`.
    /// `interval` is the duration to wait between retries, and `max_retry_count` is the maximum
    /// number of retries, after which we return `None` to indicate that we should stop retrying.
    pub fn new(interval: Duration, max_retry_count: usize) -> Self {
        Self {
            interval,
            jitter: Duration::ZERO,
            max_retry_count,
            count: 0,
        }
    }

    /// Adds up to `jitter` of random extra wait to every backoff.
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    fn jittered_interval(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.interval;
        }
        let extra = rand::thread_rng().gen_range(0..=self.jitter.as_millis());
        self.interval + Duration::from_millis(extra as u64)
    }
}

impl Backoff for ConstantWithMaxRetryCount {
    fn next_backoff(&mut self) -> Option<Duration> {
        (self.count < self.max_retry_count).then(|| {
            self.count += 1;
            self.jittered_interval()
        })
    }

    fn reset(&mut self) {
        self.count = 0;
    }
}

/// A bounded polling policy: check a condition up to `max_attempts` times,
/// waiting `interval` (plus jitter) between two checks.
///
/// This is the only place where the relayer waits on the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: usize,
    interval: Duration,
    jitter: Duration,
}

impl RetryPolicy {
    /// Creates a policy that checks at most `max_attempts` times, `interval` apart.
    pub const fn new(max_attempts: usize, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            jitter: Duration::ZERO,
        }
    }

    /// Adds a random extra wait of up to `jitter` to every interval.
    pub const fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// The maximum number of times the condition is checked.
    pub const fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// The fixed wait between two checks.
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// The longest this policy may spend sleeping, jitter excluded.
    pub fn max_wait(&self) -> Duration {
        self.interval
            .saturating_mul(self.max_attempts.saturating_sub(1) as u32)
    }

    /// The backoff between checks: one sleep less than there are checks.
    pub fn backoff(&self) -> ConstantWithMaxRetryCount {
        ConstantWithMaxRetryCount::new(
            self.interval,
            self.max_attempts.saturating_sub(1),
        )
        .with_jitter(self.jitter)
    }

    /// Polls `check` until it returns `true`.
    ///
    /// `check` receives the 1-based attempt number. Returns the number of attempts it took,
    /// or [`Error::RetryLimitReached`](crate::Error::RetryLimitReached) once `max_attempts`
    /// checks all came back `false`.
    pub async fn poll<F, Fut>(
        &self,
        what: &'static str,
        mut check: F,
    ) -> crate::Result<usize>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = bool>,
    {
        if self.max_attempts == 0 {
            return Err(crate::Error::RetryLimitReached { what, attempts: 0 });
        }
        let mut backoff = self.backoff();
        let mut attempts = 0;
        loop {
            attempts += 1;
            if check(attempts).await {
                return Ok(attempts);
            }
            match backoff.next_backoff() {
                Some(wait) => {
                    tracing::event!(
                        target: probe::TARGET,
                        tracing::Level::DEBUG,
                        kind = %probe::Kind::Retry,
                        what,
                        attempts,
                        wait = ?wait,
                    );
                    tokio::time::sleep(wait).await;
                }
                None => {
                    return Err(crate::Error::RetryLimitReached {
                        what,
                        attempts,
                    })
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(50, Duration::from_secs(5))
    }
}
