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

//! Topic-bound transforms owned by a single service.

use crate::config::ServiceConfig;
use crate::error::{SubscriptionError, TransformError};
use crate::topic::Topic;
use serde_json::Value;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Callback applied to published data when a subscription matches.
pub type Transform = Arc<dyn Fn(Value) -> Result<Value, TransformError> + Send + Sync>;

/// A topic-based data matcher that reacts to a service's publications.
///
/// Created by `Service::subscribe` and ended by `Service::unsubscribe`.
pub struct Subscription {
    service: String,
    topic: Topic,
    on: Transform,
    config: Arc<ServiceConfig>,
    active: AtomicBool,
    frozen: AtomicBool,
}

impl Subscription {
    pub(crate) fn new(
        service: &str,
        topic: Topic,
        on: Transform,
        config: Arc<ServiceConfig>,
    ) -> Self {
        Self {
            service: service.to_string(),
            topic,
            on,
            config,
            active: AtomicBool::new(true),
            frozen: AtomicBool::new(false),
        }
    }

    /// Name of the owning service.
    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    /// Returns the sub-values of `data` selected by the topic.
    ///
    /// Inactive subscriptions, and subscriptions whose service has matching
    /// disabled, never match.
    pub fn matches(&self, data: &Value) -> Vec<Value> {
        if !self.is_active() || !self.config.matching_enabled {
            return Vec::new();
        }
        self.topic.matches(data)
    }

    /// Runs the transform when `data` matches.
    ///
    /// On a mismatch the data comes back untouched when `passive`, and `None`
    /// is returned otherwise.
    pub fn process(&self, data: Value, passive: bool) -> Result<Option<Value>, TransformError> {
        if self.matches(&data).is_empty() {
            return Ok(passive.then_some(data));
        }
        (self.on)(data).map(Some)
    }

    /// Stops matching without detaching from the owning service.
    pub fn pause(&self) -> Result<(), SubscriptionError> {
        self.ensure_mutable()?;
        self.active.store(false, Ordering::Release);
        Ok(())
    }

    /// Resumes matching after a pause.
    pub fn start(&self) -> Result<(), SubscriptionError> {
        self.ensure_mutable()?;
        self.active.store(true, Ordering::Release);
        Ok(())
    }

    pub(crate) fn end(&self, freeze: bool) {
        self.active.store(false, Ordering::Release);
        if freeze {
            self.frozen.store(true, Ordering::Release);
        }
    }

    fn ensure_mutable(&self) -> Result<(), SubscriptionError> {
        if self.is_frozen() {
            return Err(SubscriptionError::Frozen(self.topic.to_string()));
        }
        Ok(())
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("service", &self.service)
            .field("topic", &self.topic)
            .field("active", &self.is_active())
            .field("frozen", &self.is_frozen())
            .finish_non_exhaustive()
    }
}
