// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Decoding of CloudWatch Logs subscription payloads.
//!
//! The subscription delivers the batch as a single base64 string holding a
//! gzip-compressed JSON document:
//!
//! ```text
//!   {"awslogs": {"data": "H4sIAAAA..."}}
//!          │
//!          v  base64
//!      gzip bytes
//!          │
//!          v  gunzip
//!      JSON RawBatch
//! ```
//!
//! The envelope is one compressed unit, so any failure leaves nothing usable
//! and aborts the invocation.

use std::io::Read;

use base64::prelude::{Engine as _, BASE64_STANDARD};
use flate2::read::MultiGzDecoder;
use serde::Deserialize;
use tracing::debug;

use crate::error::DecodeError;

/// Event handed to the function by the subscription filter.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundEvent {
    pub awslogs: AwsLogs,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AwsLogs {
    pub data: String,
}

impl InboundEvent {
    #[must_use]
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            awslogs: AwsLogs { data: data.into() },
        }
    }
}

/// Decoded batch of log entries sharing the same group, stream and owner.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawBatch {
    pub message_type: String,
    pub owner: String,
    pub log_group: String,
    pub log_stream: String,
    pub subscription_filters: Vec<String>,
    pub log_events: Vec<RawLogEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawLogEntry {
    pub id: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder;

impl Decoder {
    pub fn decode(&self, event: &InboundEvent) -> Result<RawBatch, DecodeError> {
        self.decode_data(&event.awslogs.data)
    }

    pub fn decode_data(&self, data: &str) -> Result<RawBatch, DecodeError> {
        let compressed = BASE64_STANDARD.decode(data.trim())?;

        let mut decompressed = Vec::new();
        MultiGzDecoder::new(compressed.as_slice())
            .read_to_end(&mut decompressed)
            .map_err(DecodeError::Decompress)?;

        let batch: RawBatch = serde_json::from_slice(&decompressed)?;
        debug!(
            "LOGS | Decoded batch from {} with {} log events",
            batch.log_group,
            batch.log_events.len()
        );
        Ok(batch)
    }
}
