// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Field names, platform prefixes and listener limits.
//!
//! The field names are the keys the listener side indexes on, so they must
//! stay stable across releases.

/// Raw message text, used when the message is not a JSON object.
pub const FIELD_MESSAGE: &str = "message";
pub const FIELD_MESSAGE_TYPE: &str = "messageType";
pub const FIELD_OWNER: &str = "owner";
pub const FIELD_LOG_GROUP: &str = "logGroup";
pub const FIELD_LOG_STREAM: &str = "logStream";
/// Prefix of the numbered `subscriptionFilters_<index>` fields.
pub const FIELD_SUBSCRIPTION_FILTERS: &str = "subscriptionFilters";
pub const FIELD_LOG_EVENT_ID: &str = "id";
/// Reserved by the listener for time-series ordering.
pub const FIELD_TIMESTAMP: &str = "@timestamp";
pub const FIELD_TYPE: &str = "type";

/// Lines emitted by the Lambda platform itself rather than the function.
pub const PLATFORM_PREFIXES: [&str; 3] = ["START", "END", "REPORT"];

/// Maximum serialized size of a single record accepted by the listener.
///
/// # Value: 500,000 bytes
///
/// Records above this size are dropped, never truncated.
pub const MAX_RECORD_SIZE_BYTES: usize = 500_000;

pub const DEFAULT_TYPE: &str = "logzio_cloudwatch_lambda";

/// Separates `key=value` pairs in the additional fields setting.
pub const ADDITIONAL_FIELDS_SEPARATOR: char = ';';
pub const ADDITIONAL_FIELDS_KEY_VALUE_SEPARATOR: char = '=';
