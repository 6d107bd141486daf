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

//! Visitation frontier shared by every branch of one propagation.

use parking_lot::Mutex;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use uuid::Uuid;

struct FrontierInner {
    propagation_id: Uuid,
    visited: Mutex<Vec<String>>,
}

/// Ordered names of the services already visited by one propagation.
///
/// Clones share the same visited list.
#[derive(Clone)]
pub struct Frontier {
    inner: Arc<FrontierInner>,
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new()
    }
}

impl Frontier {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(FrontierInner {
                propagation_id: Uuid::new_v4(),
                visited: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Identifier attached to every log event of this propagation.
    pub fn propagation_id(&self) -> Uuid {
        self.inner.propagation_id
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.visited.lock().iter().any(|visited| visited == name)
    }

    /// Claims `name` for the caller. Returns `false` if it was already visited.
    pub(crate) fn try_visit(&self, name: &str) -> bool {
        let mut visited = self.inner.visited.lock();
        if visited.iter().any(|visited| visited == name) {
            return false;
        }
        visited.push(name.to_string());
        true
    }

    /// Visited names in visitation order.
    pub fn visited(&self) -> Vec<String> {
        self.inner.visited.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.visited.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Debug for Frontier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frontier")
            .field("propagation_id", &self.inner.propagation_id)
            .field("visited", &*self.inner.visited.lock())
            .finish()
    }
}
