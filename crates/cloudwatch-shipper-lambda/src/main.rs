// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::env;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use tracing::{debug, error, info, info_span, Instrument};

use cloudwatch_shipper::{
    config::{Config, ENV_LOG_LEVEL},
    error::ShipperError,
    logger,
    logs::{
        decoder::InboundEvent,
        orchestrator::{BatchOrchestrator, BatchSummary},
    },
};

#[tokio::main]
pub async fn main() -> Result<(), Error> {
    // Same resolution as Config::from_env, which warns once the subscriber is up
    let log_level = env::var(ENV_LOG_LEVEL).unwrap_or_default();
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(logger::env_filter(&log_level))
        .event_format(logger::Formatter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    debug!("Logging subsystem enabled");

    info!("Setting up listener sender...");
    let orchestrator = Config::from_env()
        .map_err(ShipperError::from)
        .and_then(|config| BatchOrchestrator::from_config(&config));
    match &orchestrator {
        Ok(_) => info!("Successfully initialized listener sender"),
        Err(e) => error!("Error occurred while trying to set up listener sender: {e}"),
    }

    lambda_runtime::run(service_fn(|event| handler(&orchestrator, event))).await
}

async fn handler(
    orchestrator: &Result<BatchOrchestrator, ShipperError>,
    event: LambdaEvent<InboundEvent>,
) -> Result<BatchSummary, Error> {
    let span = info_span!("invocation", request_id = %event.context.request_id);
    async move {
        info!("Starting handling event...");
        let orchestrator = match orchestrator {
            Ok(orchestrator) => orchestrator,
            Err(e) => {
                error!("Aborting, shipper is not configured: {e}");
                return Err(Error::from(e.to_string()));
            }
        };

        match orchestrator.run(&event.payload).await {
            Ok(summary) => {
                info!("Finished lambda run");
                Ok(summary)
            }
            Err(e) => {
                error!("Aborting: {e}");
                Err(Error::from(e.to_string()))
            }
        }
    }
    .instrument(span)
    .await
}
