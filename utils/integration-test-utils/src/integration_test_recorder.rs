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

use parking_lot::Mutex;
use serde_json::Value;
use service_forest::TransformError;
use std::sync::Arc;

/// One transform invocation seen by a [`Recorder`].
#[derive(Clone, Debug, PartialEq)]
pub struct Recorded {
    pub service: String,
    pub data: Value,
}

/// Shared log of transform invocations across services.
#[derive(Clone, Default)]
pub struct Recorder {
    history: Arc<Mutex<Vec<Recorded>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transform that records the data it receives and passes it on unchanged.
    pub fn observe(
        &self,
        service: &str,
    ) -> impl Fn(Value) -> Result<Value, TransformError> + Send + Sync + 'static {
        let history = self.history.clone();
        let service = service.to_string();
        move |data: Value| {
            history.lock().push(Recorded {
                service: service.clone(),
                data: data.clone(),
            });
            Ok(data)
        }
    }

    /// Like [`Recorder::observe`], additionally setting `key` to `true` on object data.
    pub fn tag(
        &self,
        service: &str,
        key: &str,
    ) -> impl Fn(Value) -> Result<Value, TransformError> + Send + Sync + 'static {
        let observe = self.observe(service);
        let key = key.to_string();
        move |data: Value| {
            let mut data = observe(data)?;
            if let Value::Object(fields) = &mut data {
                fields.insert(key.clone(), Value::Bool(true));
            }
            Ok(data)
        }
    }

    /// Transform that records the data and then fails with `message`.
    pub fn fail(
        &self,
        service: &str,
        message: &str,
    ) -> impl Fn(Value) -> Result<Value, TransformError> + Send + Sync + 'static {
        let observe = self.observe(service);
        let message = message.to_string();
        move |data: Value| {
            observe(data)?;
            Err(TransformError::new(message.clone()))
        }
    }

    pub fn history(&self) -> Vec<Recorded> {
        self.history.lock().clone()
    }

    /// Service names in invocation order.
    pub fn services(&self) -> Vec<String> {
        self.history
            .lock()
            .iter()
            .map(|recorded| recorded.service.clone())
            .collect()
    }

    /// Data received by `service`, in invocation order.
    pub fn data_for(&self, service: &str) -> Vec<Value> {
        self.history
            .lock()
            .iter()
            .filter(|recorded| recorded.service == service)
            .map(|recorded| recorded.data.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.history.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.history.lock().clear();
    }
}
