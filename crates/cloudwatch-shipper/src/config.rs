// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::error::ConfigError;
use crate::logger::{parse_level, DEFAULT_LOG_LEVEL};
use crate::logs::constants::{
    ADDITIONAL_FIELDS_KEY_VALUE_SEPARATOR, ADDITIONAL_FIELDS_SEPARATOR, DEFAULT_TYPE,
};

pub const ENV_TOKEN: &str = "LOGZIO_TOKEN";
pub const ENV_LISTENER: &str = "LOGZIO_LISTENER";
pub const ENV_TYPE: &str = "LOGZIO_TYPE";
pub const ENV_ADDITIONAL_FIELDS: &str = "ADDITIONAL_FIELDS";
pub const ENV_SEND_ALL: &str = "SEND_ALL";
pub const ENV_TIMEOUT: &str = "TIMEOUT";
pub const ENV_COMPRESS: &str = "COMPRESS";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SEND_ALL: bool = false;
const DEFAULT_COMPRESS: bool = true;

/// Static `key=value` pairs added to every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdditionalFields {
    fields: Vec<(String, String)>,
}

impl AdditionalFields {
    /// Parses `key1=val1;key2=val2`. Whitespace is stripped everywhere and
    /// empty segments are ignored. Values may themselves contain `=`.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let stripped: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

        let mut fields = Vec::new();
        for segment in stripped.split(ADDITIONAL_FIELDS_SEPARATOR) {
            if segment.is_empty() {
                continue;
            }
            match segment.split_once(ADDITIONAL_FIELDS_KEY_VALUE_SEPARATOR) {
                Some((key, value)) if !key.is_empty() => {
                    fields.push((key.to_string(), value.to_string()));
                }
                _ => return Err(ConfigError::MalformedAdditionalField(segment.to_string())),
            }
        }
        Ok(Self { fields })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromStr for AdditionalFields {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Resolved shipper configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Account token appended to the listener URL
    pub token: String,
    /// Listener base URL, e.g. https://listener.logz.io:8071
    pub listener: String,
    /// Value of the `type` field on every record
    pub log_type: String,
    pub additional_fields: AdditionalFields,
    /// Forward Lambda platform lines (START, END, REPORT) too
    pub send_all: bool,
    /// Timeout for each request to the listener
    pub timeout: Duration,
    /// Gzip request bodies
    pub compress: bool,
    /// Level of the shipper's own logs
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: String::new(),
            listener: String::new(),
            log_type: DEFAULT_TYPE.to_string(),
            additional_fields: AdditionalFields::default(),
            send_all: DEFAULT_SEND_ALL,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            compress: DEFAULT_COMPRESS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let token = non_empty_var(ENV_TOKEN).ok_or(ConfigError::MissingVariable(ENV_TOKEN))?;
        let listener =
            non_empty_var(ENV_LISTENER).ok_or(ConfigError::MissingVariable(ENV_LISTENER))?;

        let log_type = non_empty_var(ENV_TYPE).unwrap_or_else(|| DEFAULT_TYPE.to_string());

        let additional_fields = match non_empty_var(ENV_ADDITIONAL_FIELDS) {
            Some(raw) => AdditionalFields::parse(&raw)?,
            None => AdditionalFields::default(),
        };

        let send_all = parse_var_or_default(ENV_SEND_ALL, DEFAULT_SEND_ALL, parse_bool);
        let compress = parse_var_or_default(ENV_COMPRESS, DEFAULT_COMPRESS, parse_bool);
        let timeout_secs = parse_var_or_default(ENV_TIMEOUT, DEFAULT_TIMEOUT_SECS, |v| {
            v.parse::<u64>().ok().filter(|secs| *secs > 0)
        });

        let log_level =
            parse_var_or_default(ENV_LOG_LEVEL, DEFAULT_LOG_LEVEL.to_string(), parse_level);

        let config = Self {
            token,
            listener: listener.trim_end_matches('/').to_string(),
            log_type,
            additional_fields,
            send_all,
            timeout: Duration::from_secs(timeout_secs),
            compress,
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks everything a delivery needs before any record is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingVariable(ENV_TOKEN));
        }
        if self.listener.trim().is_empty() {
            return Err(ConfigError::MissingVariable(ENV_LISTENER));
        }
        if !(self.listener.starts_with("http://") || self.listener.starts_with("https://")) {
            return Err(ConfigError::InvalidListener(self.listener.clone()));
        }
        if parse_level(&self.log_level).is_none() {
            return Err(ConfigError::InvalidLogLevel(self.log_level.clone()));
        }
        Ok(())
    }

    /// Listener URL with the token embedded, e.g. `https://host:8071/token=abc`.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        format!("{}/token={}", self.listener.trim_end_matches('/'), self.token)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "t" => Some(true),
        "false" | "0" | "f" => Some(false),
        _ => None,
    }
}

fn parse_var_or_default<T, F>(name: &str, default: T, parse: F) -> T
where
    T: std::fmt::Debug,
    F: Fn(&str) -> Option<T>,
{
    let Some(raw) = non_empty_var(name) else {
        return default;
    };
    match parse(&raw) {
        Some(value) => value,
        None => {
            warn!("CONFIG | Cannot handle value '{raw}' for {name}, reverting to default {default:?}");
            default
        }
    }
}
