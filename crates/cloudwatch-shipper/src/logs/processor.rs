// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Transformation of raw CloudWatch log entries into output records.
//!
//! # Processing Order
//!
//! ```text
//!    RawLogEntry
//!         │
//!         v
//!   ┌──────────────┐
//!   │ Eligibility  │  (drop START / END / REPORT unless send_all)
//!   └──────┬───────┘
//!         v
//!   ┌──────────────┐
//!   │   Message    │  (JSON object -> top-level keys, otherwise `message`)
//!   └──────┬───────┘
//!         v
//!   ┌──────────────┐
//!   │ Batch fields │  (messageType, owner, logGroup, logStream, filters, id)
//!   └──────┬───────┘
//!         v
//!   ┌──────────────┐
//!   │  Ingestion   │  (@timestamp, type)
//!   └──────┬───────┘
//!         v
//!   ┌──────────────┐
//!   │   Overlay    │  (additional fields, last writer wins)
//!   └──────────────┘
//! ```

use serde_json::{Map, Value};
use tracing::debug;

use crate::config::{AdditionalFields, Config};
use crate::logs::constants::{
    FIELD_LOG_EVENT_ID, FIELD_LOG_GROUP, FIELD_LOG_STREAM, FIELD_MESSAGE, FIELD_MESSAGE_TYPE,
    FIELD_OWNER, FIELD_SUBSCRIPTION_FILTERS, FIELD_TIMESTAMP, FIELD_TYPE, PLATFORM_PREFIXES,
};
use crate::logs::decoder::RawBatch;
use crate::logs::record::{FieldValue, OutputRecord};

/// Result of trying to read a message as a JSON object.
#[derive(Debug, PartialEq)]
pub enum MessageBody<'a> {
    Object(Map<String, Value>),
    Text(&'a str),
}

impl<'a> MessageBody<'a> {
    #[must_use]
    pub fn parse(message: &'a str) -> Self {
        match serde_json::from_str::<Value>(message) {
            Ok(Value::Object(map)) => MessageBody::Object(map),
            _ => MessageBody::Text(message),
        }
    }
}

#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Clone)]
pub struct LogsProcessor {
    send_all: bool,
    log_type: String,
    additional_fields: AdditionalFields,
}

impl LogsProcessor {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            send_all: config.send_all,
            log_type: config.log_type.clone(),
            additional_fields: config.additional_fields.clone(),
        }
    }

    /// Returns whether the entry should be forwarded at all.
    #[must_use]
    pub fn should_process(&self, message: &str) -> bool {
        if self.send_all {
            return true;
        }
        if PLATFORM_PREFIXES
            .iter()
            .any(|prefix| message.starts_with(prefix))
        {
            debug!("LOGS | Found a Lambda platform log (START, END or REPORT). Ignoring.");
            return false;
        }
        true
    }

    /// Builds the record for the entry at `index`, or `None` if it is skipped
    /// or `index` is out of range.
    #[must_use]
    pub fn process(&self, batch: &RawBatch, index: usize) -> Option<OutputRecord> {
        let entry = batch.log_events.get(index)?;
        if !self.should_process(&entry.message) {
            return None;
        }

        let mut record = OutputRecord::new();
        Self::add_message_fields(&mut record, &entry.message);
        Self::add_batch_fields(&mut record, batch, index);
        self.add_ingestion_fields(&mut record, entry.timestamp);
        self.add_additional_fields(&mut record);
        Some(record)
    }

    fn add_message_fields(record: &mut OutputRecord, message: &str) {
        match MessageBody::parse(message) {
            MessageBody::Object(map) => {
                for (key, value) in map {
                    record.insert(key, FieldValue::from(value));
                }
            }
            MessageBody::Text(text) => {
                debug!("LOGS | Message is not a JSON object, sending as a string");
                record.insert(FIELD_MESSAGE, text);
            }
        }
    }

    fn add_batch_fields(record: &mut OutputRecord, batch: &RawBatch, index: usize) {
        let metadata = [
            (FIELD_MESSAGE_TYPE, &batch.message_type),
            (FIELD_OWNER, &batch.owner),
            (FIELD_LOG_GROUP, &batch.log_group),
            (FIELD_LOG_STREAM, &batch.log_stream),
        ];
        for (key, value) in metadata {
            if !value.is_empty() {
                record.insert(key, value.as_str());
            }
        }

        for (filter_index, filter) in batch.subscription_filters.iter().enumerate() {
            record.insert(
                format!("{FIELD_SUBSCRIPTION_FILTERS}_{filter_index}"),
                filter.as_str(),
            );
        }

        if let Some(entry) = batch.log_events.get(index) {
            record.insert(FIELD_LOG_EVENT_ID, entry.id.as_str());
        }
    }

    fn add_ingestion_fields(&self, record: &mut OutputRecord, timestamp: i64) {
        if timestamp != 0 {
            record.insert(FIELD_TIMESTAMP, timestamp);
        }
        record.insert(FIELD_TYPE, self.log_type.as_str());
    }

    fn add_additional_fields(&self, record: &mut OutputRecord) {
        for (key, value) in self.additional_fields.iter() {
            record.insert(key, value);
        }
    }
}
