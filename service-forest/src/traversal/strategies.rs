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

//! Built-in traversal strategies.

use crate::error::PublishError;
use crate::observability::events;
use crate::service::Service;
use crate::traversal::{Frontier, Next, PropagationFuture, TraversalStrategy};
use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;
use tracing::warn;

const COMPONENT: &str = "traversal_strategies";

/// Waits for every branch, then fails with the first error in branch order.
///
/// A failing branch never cancels its siblings.
pub async fn settle_all(
    service: &str,
    branches: Vec<PropagationFuture>,
) -> Result<Vec<Value>, PublishError> {
    collect_settled(service, join_all(branches).await)
}

fn collect_settled(
    service: &str,
    settled: Vec<Result<Value, PublishError>>,
) -> Result<Vec<Value>, PublishError> {
    let mut results = Vec::with_capacity(settled.len());
    let mut first_error = None;

    for outcome in settled {
        match outcome {
            Ok(value) => results.push(value),
            Err(err) => {
                warn!(
                    event = events::PUBLISH_BRANCH_FAILED,
                    component = COMPONENT,
                    service,
                    err = %err,
                    "propagation branch failed"
                );
                first_error.get_or_insert(err);
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(results),
    }
}

/// Steps every child concurrently.
pub struct BreadthDown;

#[async_trait]
impl TraversalStrategy for BreadthDown {
    async fn step(
        &self,
        at: &Service,
        next: Next,
        data: Value,
        frontier: Frontier,
    ) -> Result<Vec<Value>, PublishError> {
        let branches = at
            .children()
            .into_iter()
            .map(|child| next(child, data.clone(), frontier.clone()))
            .collect();
        settle_all(at.name(), branches).await
    }
}

/// Steps the parent and every service sharing the parent's depth concurrently.
pub struct BreadthUp;

#[async_trait]
impl TraversalStrategy for BreadthUp {
    async fn step(
        &self,
        at: &Service,
        next: Next,
        data: Value,
        frontier: Frontier,
    ) -> Result<Vec<Value>, PublishError> {
        let Some(parent) = at.parent() else {
            return Ok(Vec::new());
        };

        let mut neighbors = vec![parent.clone()];
        neighbors.extend(parent.siblings());

        let branches = neighbors
            .into_iter()
            .map(|neighbor| next(neighbor, data.clone(), frontier.clone()))
            .collect();
        settle_all(at.name(), branches).await
    }
}

/// Steps children one at a time, each subtree settling before the next starts.
pub struct DepthDown;

#[async_trait]
impl TraversalStrategy for DepthDown {
    async fn step(
        &self,
        at: &Service,
        next: Next,
        data: Value,
        frontier: Frontier,
    ) -> Result<Vec<Value>, PublishError> {
        let mut settled = Vec::new();
        for child in at.children() {
            settled.push(next(child, data.clone(), frontier.clone()).await);
        }
        collect_settled(at.name(), settled)
    }
}

#[cfg(test)]
mod tests {
    use super::settle_all;
    use crate::error::{PublishError, TransformError};
    use crate::traversal::PropagationFuture;
    use futures::FutureExt;
    use serde_json::{json, Value};

    fn failing(service: &str) -> PropagationFuture {
        let service = service.to_string();
        async move {
            Err(PublishError::Transform {
                service,
                source: TransformError::new("boom"),
            })
        }
        .boxed()
    }

    fn succeeding(value: Value) -> PropagationFuture {
        async move { Ok(value) }.boxed()
    }

    #[tokio::test]
    async fn settle_all_collects_successes_in_order() {
        let results = settle_all("root", vec![succeeding(json!(1)), succeeding(json!(2))])
            .await
            .unwrap();

        assert_eq!(results, vec![json!(1), json!(2)]);
    }

    #[tokio::test]
    async fn settle_all_runs_every_branch_and_keeps_first_error() {
        let (tx, rx) = std::sync::mpsc::channel();
        let tracked = async move {
            tx.send(()).unwrap();
            Ok(json!("late sibling"))
        }
        .boxed();

        let result = settle_all("root", vec![failing("a"), failing("b"), tracked]).await;

        assert!(rx.try_recv().is_ok());
        match result {
            Err(PublishError::Transform { service, .. }) => assert_eq!(service, "a"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
