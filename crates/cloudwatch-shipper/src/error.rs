// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Errors raised while resolving the shipper configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    MissingVariable(&'static str),

    #[error("Malformed additional field '{0}', expected key=value")]
    MalformedAdditionalField(String),

    #[error("Invalid listener URL '{0}'")]
    InvalidListener(String),

    #[error("Invalid log level '{0}'. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Errors raised while decoding the inbound CloudWatch Logs payload
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Could not base64 decode payload data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Could not gunzip payload data: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("Could not parse decompressed payload: {0}")]
    Schema(#[from] serde_json::Error),
}

/// Errors that abort a whole invocation
#[derive(Debug, thiserror::Error)]
pub enum ShipperError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to decode event: {0}")]
    Decode(#[from] DecodeError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_variable_display() {
        let error = ConfigError::MissingVariable("LOGZIO_TOKEN");
        assert_eq!(error.to_string(), "LOGZIO_TOKEN must be set");
    }

    #[test]
    fn test_shipper_error_wraps_config_error() {
        let error: ShipperError = ConfigError::MissingVariable("LOGZIO_LISTENER").into();
        assert_eq!(
            error.to_string(),
            "Invalid configuration: LOGZIO_LISTENER must be set"
        );
    }

    #[test]
    fn test_decode_error_from_schema() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: ShipperError = DecodeError::from(json_err).into();
        assert!(error
            .to_string()
            .starts_with("Failed to decode event: Could not parse decompressed payload"));
    }
}
