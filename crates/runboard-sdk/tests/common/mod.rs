//! Common test utilities for SDK integration tests

#![allow(dead_code)]

use runboard_sdk::{RunsResponse, TaggedResponse};
use serde_json::{json, Value as Json};

/// Raw payload for one run
pub fn raw_run(id: &str, name: &str, optimizer: &str, lr: f64, acc: f64) -> Json {
    json!({
        "id": id,
        "name": name,
        "state": "finished",
        "user": {"username": "mcgee", "photoUrl": "example.com"},
        "createdAt": "2018-03-28T02:19:09.777",
        "heartbeatAt": "2018-03-28T02:29:09.777",
        "tags": [],
        "config": json!({
            "optimizer": {"value": optimizer},
            "lr": {"value": lr}
        }).to_string(),
        "summaryMetrics": json!({"acc": acc}).to_string()
    })
}

/// A small project: two optimizers, three learning rates
pub fn project_batch() -> Vec<Json> {
    vec![
        raw_run("1", "r1", "sgd", 0.1, 0.81),
        raw_run("2", "r2", "adam", 0.01, 0.93),
        raw_run("3", "r3", "adam", 0.001, 0.88),
        raw_run("4", "r4", "sgd", 0.1, 0.75),
        raw_run("5", "r5", "sgd", 0.05, 0.90),
    ]
}

/// Assertion helpers for responses
pub trait ResponseAssertions {
    fn filtered_names(&self) -> Vec<String>;
    fn row_names(&self) -> Vec<String>;
}

impl ResponseAssertions for RunsResponse {
    fn filtered_names(&self) -> Vec<String> {
        self.filtered.iter().map(|r| r.name().to_string()).collect()
    }

    fn row_names(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.run.name().to_string()).collect()
    }
}

impl ResponseAssertions for TaggedResponse {
    fn filtered_names(&self) -> Vec<String> {
        self.response.filtered_names()
    }

    fn row_names(&self) -> Vec<String> {
        self.response.row_names()
    }
}
