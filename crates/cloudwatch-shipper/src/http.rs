// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use core::time::Duration;

use crate::config::Config;

const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(270);

/// Builds the HTTP client used to reach the listener.
///
/// The client is created once per execution environment and reused across
/// invocations, so idle connections are kept for a while between them.
pub fn build_client(config: &Config) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(config.timeout)
        .pool_idle_timeout(Some(POOL_IDLE_TIMEOUT))
        // Detect dead connections between invocations
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .build()
}
