// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! CloudWatch Logs forwarding pipeline.
//!
//! ```text
//!   awslogs.data ──> decoder ──> processor ──> flusher ──> listener
//!                       └──────── orchestrator ──────┘
//! ```
//!
//! - **[`decoder`]**: base64 + gzip + JSON into a [`decoder::RawBatch`]
//! - **[`processor`]**: builds one [`record::OutputRecord`] per eligible entry
//! - **[`flusher`]**: serializes, compresses and POSTs a record with retries
//! - **[`orchestrator`]**: drives one batch and reports a summary

pub mod constants;
pub mod decoder;
pub mod flusher;
pub mod orchestrator;
pub mod processor;
pub mod record;
pub mod retry;
