// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;
use std::time::Duration;

use base64::{prelude::BASE64_STANDARD, Engine};
use cloudwatch_shipper::{
    config::{AdditionalFields, Config},
    http::build_client,
    logs::{
        decoder::{Decoder, InboundEvent},
        flusher::Flusher,
        orchestrator::{BatchOrchestrator, BatchSummary},
        processor::LogsProcessor,
        retry::RetryPolicy,
    },
};
use flate2::{write::GzEncoder, Compression};
use mockito::{Matcher, Server};
use serde_json::json;

fn event(messages: &[&str]) -> InboundEvent {
    let log_events: Vec<_> = messages
        .iter()
        .enumerate()
        .map(|(i, m)| json!({"id": format!("evt-{i}"), "timestamp": 1_700_000_000_000_i64 + i as i64, "message": m}))
        .collect();
    let payload = json!({
        "messageType": "DATA_MESSAGE",
        "owner": "123456789012",
        "logGroup": "/aws/lambda/my-function",
        "logStream": "2024/01/01/[$LATEST]abc",
        "subscriptionFilters": ["logzio-filter"],
        "logEvents": log_events,
    });

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(payload.to_string().as_bytes())
        .expect("failed to gzip payload");
    let compressed = encoder.finish().expect("failed to finish gzip");
    InboundEvent::new(BASE64_STANDARD.encode(compressed))
}

fn orchestrator(config: &Config) -> BatchOrchestrator {
    let client = build_client(config).expect("failed to build client");
    let flusher = Flusher::new(config, client).with_policy(RetryPolicy {
        max_attempts: 4,
        initial_backoff: Duration::ZERO,
    });
    BatchOrchestrator::new(Decoder, LogsProcessor::new(config), flusher)
}

fn config(listener: String) -> Config {
    Config {
        token: "test-token".to_string(),
        listener,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_ships_compressed_records() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/token=test-token")
        .match_header("content-encoding", "gzip")
        .match_header("content-type", "application/json")
        .with_status(200)
        .expect(2)
        .create_async()
        .await;

    let summary = orchestrator(&config(server.url()))
        .run(&event(&[
            "START RequestId: 1 Version: $LATEST",
            "{\"level\":\"info\",\"msg\":\"hello\"}",
            "plain text line",
        ]))
        .await
        .expect("run failed");

    mock.assert_async().await;
    assert_eq!(
        summary,
        BatchSummary {
            delivered: 2,
            total: 2,
            skipped: 1
        }
    );
}

#[tokio::test]
async fn test_uncompressed_record_body() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/token=test-token")
        .match_header("content-encoding", Matcher::Missing)
        .match_body(Matcher::PartialJsonString(
            r#"{
                "level": "error",
                "logGroup": "/aws/lambda/my-function",
                "subscriptionFilters_0": "logzio-filter",
                "id": "evt-0",
                "@timestamp": 1700000000000,
                "type": "custom_type",
                "env": "prod"
            }"#
            .to_string(),
        ))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let config = Config {
        compress: false,
        log_type: "custom_type".to_string(),
        additional_fields: AdditionalFields::parse("env=prod").expect("bad fields"),
        ..config(server.url())
    };
    let summary = orchestrator(&config)
        .run(&event(&["{\"level\":\"error\"}"]))
        .await
        .expect("run failed");

    mock.assert_async().await;
    assert_eq!(summary.delivered, 1);
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/token=test-token")
        .with_status(500)
        .expect(4)
        .create_async()
        .await;

    let summary = orchestrator(&config(server.url()))
        .run(&event(&["hello"]))
        .await
        .expect("run failed");

    mock.assert_async().await;
    assert_eq!(summary.delivered, 0);
    assert_eq!(summary.total, 1);
}

#[tokio::test]
async fn test_not_found_is_terminal() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/token=test-token")
        .with_status(404)
        .expect(1)
        .create_async()
        .await;

    let summary = orchestrator(&config(server.url()))
        .run(&event(&["hello"]))
        .await
        .expect("run failed");

    mock.assert_async().await;
    assert_eq!(summary.delivered, 0);
}

#[tokio::test]
async fn test_trailing_slash_in_listener() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/token=test-token")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let summary = orchestrator(&config(format!("{}/", server.url())))
        .run(&event(&["hello"]))
        .await
        .expect("run failed");

    mock.assert_async().await;
    assert_eq!(summary.delivered, 1);
}
