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

//! # service-forest
//!
//! `service-forest` is a hierarchical, topic-addressed publish/subscribe engine.
//! Named [`Service`]s hold state, form parent/child trees inside a [`Forest`]
//! and react to published data through topic-bound [`Subscription`]s.
//!
//! ## Quick start
//!
//! ```
//! use serde_json::{json, Value};
//! use service_forest::{Forest, ServiceBuilder, TransformError, Traversal};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let forest = Forest::new();
//! let app = forest.service("app").unwrap();
//! let list = ServiceBuilder::new("list").parent(&app).build(&forest).unwrap();
//!
//! list.subscribe("$.todo", |mut data: Value| {
//!     data["seen_by_list"] = json!(true);
//!     Ok::<_, TransformError>(data)
//! })
//! .unwrap();
//!
//! // Breadth-first down from the root: `app` has no matching subscription and
//! // passes the data on untouched.
//! let published = app
//!     .publish_with(json!({"todo": "write docs"}), Traversal::breadth_down())
//!     .await
//!     .unwrap();
//! assert_eq!(published, json!({"todo": "write docs"}));
//!
//! // Publishing up from the leaf applies the leaf's transform first.
//! let published = list
//!     .publish_with(json!({"todo": "ship"}), Traversal::breadth_up())
//!     .await
//!     .unwrap();
//! assert_eq!(published, json!({"todo": "ship", "seen_by_list": true}));
//! # });
//! ```
//!
//! ## Duplicate names
//!
//! ```
//! use service_forest::{Forest, ForestError};
//!
//! let forest = Forest::new();
//! forest.service("unique").unwrap();
//!
//! assert_eq!(
//!     forest.service("unique").unwrap_err(),
//!     ForestError::DuplicateName("unique".to_string())
//! );
//! ```
//!
//! ## Internal architecture map
//!
//! - Forest: name registry and node arena, cycle checks, tree queries
//! - Service: handle API for state, subscriptions, relationships and publishing
//! - Topic: equality and structured-query matching
//! - Traversal: strategy registry, visitation frontier and built-in strategies
//! - Config: json5-backed forest and per-service options
//!
//! ## Observability model
//!
//! The crate uses `tracing` for logs/events.
//! Library code emits events and does not initialize a global subscriber.
//! Tests and embedding applications are responsible for one-time
//! `tracing_subscriber` initialization.

pub mod config;
pub use config::{ForestConfig, PublishDefaults, ServiceConfig};

pub mod error;
pub use error::{
    ConfigError, ForestError, PublishError, QueryParseError, SubscriptionError, TransformError,
};

mod forest;
pub use forest::Forest;

#[doc(hidden)]
pub mod observability;

mod service;
pub use service::{Service, ServiceBuilder};

mod subscription;
pub use subscription::{Subscription, Transform};

pub mod topic;
pub use topic::{Query, Topic};

pub mod traversal;
pub use traversal::{Direction, Frontier, Traversal};
