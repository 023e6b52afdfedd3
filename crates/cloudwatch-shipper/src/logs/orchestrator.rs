// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Per-invocation driver of the decode, transform and send pipeline.
//!
//! One invocation walks `Init -> Decoded -> Processing -> Drained`. Only a
//! decode failure stops it early; a record that fails to transform or send
//! is counted as dropped and the next entry is processed.

use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::ShipperError;
use crate::http::build_client;
use crate::logs::decoder::{Decoder, InboundEvent};
use crate::logs::flusher::{DeliveryOutcome, Flusher};
use crate::logs::processor::LogsProcessor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Decoded,
    Processing,
    Drained,
}

/// Counts reported once per invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Records accepted by the listener
    pub delivered: usize,
    /// Records built and handed to the flusher
    pub total: usize,
    /// Platform lines filtered out before a record was built
    pub skipped: usize,
}

/// Reusable across invocations; holds no per-batch state.
pub struct BatchOrchestrator {
    decoder: Decoder,
    processor: LogsProcessor,
    flusher: Flusher,
}

impl BatchOrchestrator {
    #[must_use]
    pub fn new(decoder: Decoder, processor: LogsProcessor, flusher: Flusher) -> Self {
        Self {
            decoder,
            processor,
            flusher,
        }
    }

    /// Wires the pipeline for `config`, which must be complete.
    pub fn from_config(config: &Config) -> Result<Self, ShipperError> {
        config.validate()?;
        let client = build_client(config).map_err(|e| ShipperError::HttpClient(e.to_string()))?;
        Ok(Self::new(
            Decoder,
            LogsProcessor::new(config),
            Flusher::new(config, client),
        ))
    }

    pub async fn run(&self, event: &InboundEvent) -> Result<BatchSummary, ShipperError> {
        let mut phase = Phase::Init;
        let batch = self.decoder.decode(event)?;
        transition(&mut phase, Phase::Decoded);
        debug!("LOGS | Detected {} logs in event", batch.log_events.len());

        transition(&mut phase, Phase::Processing);
        let mut summary = BatchSummary::default();
        for index in 0..batch.log_events.len() {
            let Some(record) = self.processor.process(&batch, index) else {
                summary.skipped += 1;
                continue;
            };
            summary.total += 1;
            if self.flusher.send(&record).await == DeliveryOutcome::Delivered {
                summary.delivered += 1;
            }
        }

        transition(&mut phase, Phase::Drained);
        info!(
            "LOGS | Wrote {} of {} logs to the listener ({} platform logs skipped)",
            summary.delivered, summary.total, summary.skipped
        );
        Ok(summary)
    }
}

fn transition(phase: &mut Phase, next: Phase) {
    debug!("LOGS | Batch {phase:?} -> {next:?}");
    *phase = next;
}
