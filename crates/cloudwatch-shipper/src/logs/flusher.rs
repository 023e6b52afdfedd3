// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Delivery of output records to the listener.
//!
//! # Pipeline
//!
//! ```text
//!   OutputRecord
//!       │
//!       v
//!   ┌─────────────┐
//!   │  Serialize  │ (JSON line)
//!   └──────┬──────┘
//!          v
//!   ┌─────────────┐
//!   │ Size check  │ (500,000 bytes, drop if above)
//!   └──────┬──────┘
//!          v
//!   ┌─────────────┐
//!   │  Compress   │ (gzip, optional)
//!   └──────┬──────┘
//!          v
//!   ┌─────────────┐
//!   │  HTTP POST  │ (retry on anything but 200/400/401/403/404)
//!   └─────────────┘
//! ```
//!
//! A record that cannot be delivered is reported through [`DeliveryOutcome`]
//! and never surfaces as an error to the caller.

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use flate2::{write::GzEncoder, Compression};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_ENCODING, CONTENT_TYPE};
use thiserror::Error as ThisError;
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::logs::constants::MAX_RECORD_SIZE_BYTES;
use crate::logs::record::OutputRecord;
use crate::logs::retry::{AttemptResult, RetryPolicy, RetryState, Sleeper, TokioSleeper};

/// Error returned when a request got no HTTP response at all.
#[derive(ThisError, Debug)]
#[error("{message}")]
pub struct FlushError {
    pub message: String,
}

impl From<reqwest::Error> for FlushError {
    fn from(e: reqwest::Error) -> Self {
        FlushError {
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Serialize,
    Oversize,
    Compress,
    TransportExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Dropped(DropReason),
}

/// Sends one request body to the listener and reports the response status.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, body: Bytes, compressed: bool) -> Result<u16, FlushError>;
}

/// [`Transport`] backed by a reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    #[must_use]
    pub fn new(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }

    fn headers(compressed: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if compressed {
            headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        }
        headers
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, body: Bytes, compressed: bool) -> Result<u16, FlushError> {
        let resp = self
            .client
            .post(&self.url)
            .headers(Self::headers(compressed))
            .body(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        match resp.text().await {
            Ok(text) => debug!("LOGS | Listener responded {status}: {text}"),
            Err(e) => debug!("LOGS | Listener responded {status}, unreadable body: {e}"),
        }
        Ok(status)
    }
}

#[derive(Clone)]
pub struct Flusher {
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
    compress: bool,
}

impl Flusher {
    /// Flusher posting to the listener configured in `config`.
    #[must_use]
    pub fn new(config: &Config, client: reqwest::Client) -> Self {
        Self::with_transport(
            Arc::new(HttpTransport::new(client, config.endpoint_url())),
            Arc::new(TokioSleeper),
            config.compress,
        )
    }

    #[must_use]
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        sleeper: Arc<dyn Sleeper>,
        compress: bool,
    ) -> Self {
        Self {
            transport,
            sleeper,
            policy: RetryPolicy::default(),
            compress,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn send(&self, record: &OutputRecord) -> DeliveryOutcome {
        let mut payload = match record.to_json_bytes() {
            Ok(payload) => payload,
            Err(e) => {
                error!("LOGS | Failed to serialize record {record:?}: {e}. Log will be dropped");
                return DeliveryOutcome::Dropped(DropReason::Serialize);
            }
        };

        if payload.len() > MAX_RECORD_SIZE_BYTES {
            warn!(
                "LOGS | Record of {} bytes exceeds the {MAX_RECORD_SIZE_BYTES} bytes limit. Log will be dropped",
                payload.len()
            );
            return DeliveryOutcome::Dropped(DropReason::Oversize);
        }
        payload.push(b'\n');

        let body = if self.compress {
            match Self::encode(&payload) {
                Ok(compressed) => compressed,
                Err(e) => {
                    error!("LOGS | Failed to compress record: {e}. Log will be dropped");
                    return DeliveryOutcome::Dropped(DropReason::Compress);
                }
            }
        } else {
            payload
        };

        let (attempts, last) = self.post_with_retry(Bytes::from(body)).await;
        if last.is_success() {
            debug!("LOGS | Record delivered after {attempts} attempt(s)");
            DeliveryOutcome::Delivered
        } else {
            error!("LOGS | Error sending log after {attempts} attempt(s), last result: {last:?}");
            DeliveryOutcome::Dropped(DropReason::TransportExhausted)
        }
    }

    async fn post_with_retry(&self, body: Bytes) -> (u32, AttemptResult) {
        let mut state = RetryState::Attempt(1);
        loop {
            state = match state {
                RetryState::Attempt(attempt) => {
                    let result = match self.transport.post(body.clone(), self.compress).await {
                        Ok(status) => AttemptResult::Status(status),
                        Err(e) => {
                            warn!("LOGS | Failed to reach listener (attempt {attempt}): {e}");
                            AttemptResult::TransportFailure
                        }
                    };
                    let next = self.policy.on_result(attempt, result);
                    debug!("LOGS | Attempt {attempt} got {result:?}, next: {next:?}");
                    next
                }
                RetryState::Backoff {
                    next_attempt,
                    delay,
                } => {
                    warn!("LOGS | Failed to send log, trying again in {delay:?}");
                    self.sleeper.sleep(delay).await;
                    RetryState::Attempt(next_attempt)
                }
                RetryState::Terminal { attempts, last } => return (attempts, last),
            };
        }
    }

    fn encode(data: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data)?;
        encoder.finish()
    }
}
