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

//! Traversal engine.
//!
//! A propagation visits one service at a time through [`step`]: the visit
//! runs the service's local action, records the service in the shared
//! [`Frontier`] and hands the result to a [`TraversalStrategy`], which picks
//! the neighbors and calls `next` on each of them.
//!
//! Strategies are looked up by `(name, direction)` in the forest's
//! [`TraversalRegistry`] and new ones can be registered at runtime:
//!
//! ```
//! use async_trait::async_trait;
//! use serde_json::{json, Value};
//! use service_forest::traversal::{settle_all, Next, TraversalStrategy};
//! use service_forest::{Direction, Forest, Frontier, PublishError, Service, ServiceBuilder, Traversal};
//! use std::sync::Arc;
//!
//! /// Walks straight up the parent chain, ignoring siblings.
//! struct Lineage;
//!
//! #[async_trait]
//! impl TraversalStrategy for Lineage {
//!     async fn step(
//!         &self,
//!         at: &Service,
//!         next: Next,
//!         data: Value,
//!         frontier: Frontier,
//!     ) -> Result<Vec<Value>, PublishError> {
//!         let branches = at
//!             .parent()
//!             .into_iter()
//!             .map(|parent| next(parent, data.clone(), frontier.clone()))
//!             .collect();
//!         settle_all(at.name(), branches).await
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let forest = Forest::new();
//! forest.strategies().add("lineage", Direction::Up, Arc::new(Lineage));
//!
//! let root = forest.service("root").unwrap();
//! let leaf = ServiceBuilder::new("leaf").parent(&root).build(&forest).unwrap();
//!
//! let result = leaf
//!     .publish_with(json!({"ping": true}), Traversal::new("lineage", Direction::Up))
//!     .await
//!     .unwrap();
//! assert_eq!(result, json!({"ping": true}));
//! # });
//! ```

mod frontier;
mod registry;
mod strategies;

pub use frontier::Frontier;
pub use registry::TraversalRegistry;
pub use strategies::{settle_all, BreadthDown, BreadthUp, DepthDown};

use crate::error::PublishError;
use crate::observability::events;
use crate::service::Service;
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tracing::{debug, warn};

const COMPONENT: &str = "traversal";

pub const BREADTH: &str = "breadth";
pub const DEPTH: &str = "depth";

/// Which way a propagation moves through the tree.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards parents (and their global siblings).
    Up,
    /// Towards children.
    #[default]
    Down,
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Up => f.write_str("up"),
            Direction::Down => f.write_str("down"),
        }
    }
}

/// Named strategy plus direction selecting a registered step function.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Traversal {
    pub strategy: String,
    pub direction: Direction,
}

impl Traversal {
    pub fn new(strategy: impl Into<String>, direction: Direction) -> Self {
        Self {
            strategy: strategy.into(),
            direction,
        }
    }

    pub fn breadth_down() -> Self {
        Self::new(BREADTH, Direction::Down)
    }

    pub fn breadth_up() -> Self {
        Self::new(BREADTH, Direction::Up)
    }

    pub fn depth_down() -> Self {
        Self::new(DEPTH, Direction::Down)
    }
}

impl Default for Traversal {
    fn default() -> Self {
        Self::breadth_down()
    }
}

impl Display for Traversal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.strategy, self.direction)
    }
}

/// Future resolving once a propagation branch has settled.
pub type PropagationFuture = BoxFuture<'static, Result<Value, PublishError>>;

/// Continuation a strategy calls to propagate into a neighbor.
pub type Next = Arc<dyn Fn(Service, Value, Frontier) -> PropagationFuture + Send + Sync>;

/// Picks the neighbors of a visited service and propagates into them.
///
/// Implementations should call `next` once per neighbor and only resolve
/// after every branch settled; [`settle_all`] does the waiting and error
/// isolation for concurrent fan-outs.
#[async_trait]
pub trait TraversalStrategy: Send + Sync {
    async fn step(
        &self,
        at: &Service,
        next: Next,
        data: Value,
        frontier: Frontier,
    ) -> Result<Vec<Value>, PublishError>;
}

/// Visits `at` once per propagation and advances with the selected strategy.
///
/// Already-visited services resolve to the unmodified input. The result of
/// `action` is returned once the strategy's fan-out settled.
pub async fn step<A>(
    at: &Service,
    traversal: &Traversal,
    data: Value,
    action: A,
    next: Next,
    frontier: Frontier,
) -> Result<Value, PublishError>
where
    A: FnOnce(Value) -> Result<Value, PublishError> + Send,
{
    let Some(strategy) = at.forest().strategies().get(traversal) else {
        warn!(
            event = events::TRAVERSAL_UNKNOWN,
            component = COMPONENT,
            service = at.name(),
            strategy = %traversal.strategy,
            direction = %traversal.direction,
            "no strategy registered"
        );
        return Err(PublishError::UnknownTraversal {
            strategy: traversal.strategy.clone(),
            direction: traversal.direction,
        });
    };

    let can_advance = match traversal.direction {
        Direction::Up => !at.is_root(),
        Direction::Down => !at.is_leaf(),
    };

    if !frontier.try_visit(at.name()) {
        debug!(
            event = events::TRAVERSAL_FRONTIER_SKIP,
            component = COMPONENT,
            service = at.name(),
            propagation_id = %frontier.propagation_id(),
            "service already visited"
        );
        return Ok(data);
    }

    let result = action(data)?;
    if can_advance {
        strategy.step(at, next, result.clone(), frontier).await?;
    }
    Ok(result)
}
