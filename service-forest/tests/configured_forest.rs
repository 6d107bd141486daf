/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

mod support;

use async_trait::async_trait;
use integration_test_utils::Recorder;
use serde_json::{json, Value};
use service_forest::traversal::{settle_all, Next, TraversalStrategy};
use service_forest::{
    ConfigError, Direction, Forest, ForestConfig, Frontier, PublishError, Service,
    ServiceBuilder, ServiceConfig, Traversal,
};
use std::sync::Arc;
use support::make_chain;

const FOREST_CONFIG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/forest.json5");

/// Climbs the parent chain only, never fanning out to siblings.
struct Lineage;

#[async_trait]
impl TraversalStrategy for Lineage {
    async fn step(
        &self,
        at: &Service,
        next: Next,
        data: Value,
        frontier: Frontier,
    ) -> Result<Vec<Value>, PublishError> {
        let branches = at
            .parent()
            .into_iter()
            .map(|parent| next(parent, data.clone(), frontier.clone()))
            .collect();
        settle_all(at.name(), branches).await
    }
}

fn configured_forest() -> Forest {
    let config = ForestConfig::from_file(FOREST_CONFIG).expect("fixture config should load");
    Forest::with_config(config)
}

#[test]
fn fixture_config_is_loaded_from_disk() {
    integration_test_utils::init_logging();

    let config = ForestConfig::from_file(FOREST_CONFIG).unwrap();

    assert!(!config.service.matching_enabled);
    assert_eq!(
        config.publish.traversal(),
        Traversal::new("lineage", Direction::Up)
    );
}

#[test]
fn missing_config_file_is_an_io_error() {
    integration_test_utils::init_logging();

    let error = ForestConfig::from_file("does/not/exist.json5").unwrap_err();

    assert!(matches!(error, ConfigError::Io(_)));
}

#[tokio::test]
async fn default_publish_uses_configured_traversal() {
    integration_test_utils::init_logging();
    let forest = configured_forest();
    let chain = make_chain(&forest, &["root", "leaf"]);

    let error = chain[1].publish(json!(1)).await.unwrap_err();
    assert_eq!(
        error,
        PublishError::UnknownTraversal {
            strategy: "lineage".to_string(),
            direction: Direction::Up,
        }
    );

    forest
        .strategies()
        .add("lineage", Direction::Up, Arc::new(Lineage));
    assert_eq!(chain[1].publish(json!(1)).await.unwrap(), json!(1));
}

#[tokio::test]
async fn disabled_matching_can_be_overridden_per_service() {
    integration_test_utils::init_logging();
    let forest = configured_forest();
    forest
        .strategies()
        .add("lineage", Direction::Up, Arc::new(Lineage));
    let recorder = Recorder::new();

    let root = ServiceBuilder::new("root")
        .config(ServiceConfig {
            matching_enabled: true,
        })
        .build(&forest)
        .unwrap();
    let muted = ServiceBuilder::new("muted").parent(&root).build(&forest).unwrap();
    let leaf = ServiceBuilder::new("leaf").parent(&muted).build(&forest).unwrap();
    let cousin = forest.service("cousin").unwrap();

    for service in [&root, &muted, &leaf, &cousin] {
        service
            .subscribe_all(recorder.observe(service.name()))
            .unwrap();
    }

    leaf.publish(json!({"from": "leaf"})).await.unwrap();

    assert!(!muted.config().matching_enabled);
    assert_eq!(recorder.services(), vec!["root"]);
}

#[tokio::test]
async fn custom_strategy_skips_siblings_that_breadth_up_would_visit() {
    integration_test_utils::init_logging();
    let forest = Forest::new();
    forest
        .strategies()
        .add("lineage", Direction::Up, Arc::new(Lineage));
    let recorder = Recorder::new();
    make_chain(&forest, &["other-root"]);
    let chain = make_chain(&forest, &["root", "mid", "leaf"]);

    for service in forest.services().values() {
        service
            .subscribe_all(recorder.observe(service.name()))
            .unwrap();
    }

    chain[2]
        .publish_with(json!(0), Traversal::new("lineage", Direction::Up))
        .await
        .unwrap();
    assert_eq!(recorder.services(), vec!["leaf", "mid", "root"]);

    recorder.clear();
    chain[2]
        .publish_with(json!(0), Traversal::breadth_up())
        .await
        .unwrap();
    assert!(recorder.services().contains(&"other-root".to_string()));
}
