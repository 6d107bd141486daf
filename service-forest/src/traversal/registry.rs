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

use crate::observability::events;
use crate::traversal::{
    BreadthDown, BreadthUp, DepthDown, Direction, Traversal, TraversalStrategy, BREADTH, DEPTH,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

const COMPONENT: &str = "traversal_registry";

type StrategyKey = (String, Direction);

/// Strategies available to one forest, keyed by name and direction.
pub struct TraversalRegistry {
    strategies: RwLock<HashMap<StrategyKey, Arc<dyn TraversalStrategy>>>,
}

impl TraversalRegistry {
    /// An empty registry. Every publish fails until strategies are added.
    pub fn empty() -> Self {
        Self {
            strategies: RwLock::new(HashMap::new()),
        }
    }

    /// Registry holding `breadth/down`, `breadth/up` and `depth/down`.
    pub fn with_defaults() -> Self {
        let registry = Self::empty();
        registry.insert(BREADTH, Direction::Down, Arc::new(BreadthDown));
        registry.insert(BREADTH, Direction::Up, Arc::new(BreadthUp));
        registry.insert(DEPTH, Direction::Down, Arc::new(DepthDown));
        registry
    }

    /// Registers `strategy`, replacing any previous one under the same key.
    ///
    /// Returns `true` when an existing strategy was replaced.
    pub fn add(
        &self,
        name: impl Into<String>,
        direction: Direction,
        strategy: Arc<dyn TraversalStrategy>,
    ) -> bool {
        let name = name.into();
        let replaced = self.insert(&name, direction, strategy);
        if replaced {
            warn!(
                event = events::TRAVERSAL_STRATEGY_REGISTERED,
                component = COMPONENT,
                strategy = %name,
                direction = %direction,
                replaced,
                "replaced traversal strategy"
            );
        } else {
            debug!(
                event = events::TRAVERSAL_STRATEGY_REGISTERED,
                component = COMPONENT,
                strategy = %name,
                direction = %direction,
                replaced,
                "registered traversal strategy"
            );
        }
        replaced
    }

    pub fn get(&self, traversal: &Traversal) -> Option<Arc<dyn TraversalStrategy>> {
        self.strategies
            .read()
            .get(&(traversal.strategy.clone(), traversal.direction))
            .cloned()
    }

    pub fn contains(&self, traversal: &Traversal) -> bool {
        self.strategies
            .read()
            .contains_key(&(traversal.strategy.clone(), traversal.direction))
    }

    /// Registered traversals, sorted by name then direction.
    pub fn traversals(&self) -> Vec<Traversal> {
        let mut traversals: Vec<Traversal> = self
            .strategies
            .read()
            .keys()
            .map(|(name, direction)| Traversal::new(name.clone(), *direction))
            .collect();
        traversals.sort_by(|a, b| {
            a.strategy
                .cmp(&b.strategy)
                .then_with(|| a.direction.to_string().cmp(&b.direction.to_string()))
        });
        traversals
    }

    fn insert(&self, name: &str, direction: Direction, strategy: Arc<dyn TraversalStrategy>) -> bool {
        self.strategies
            .write()
            .insert((name.to_string(), direction), strategy)
            .is_some()
    }
}

impl Default for TraversalRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::TraversalRegistry;
    use crate::traversal::{DepthDown, Direction, Traversal};
    use std::sync::Arc;

    #[test]
    fn defaults_cover_builtin_traversals() {
        let registry = TraversalRegistry::with_defaults();

        assert_eq!(
            registry.traversals(),
            vec![
                Traversal::breadth_down(),
                Traversal::breadth_up(),
                Traversal::depth_down(),
            ]
        );
        assert!(!registry.contains(&Traversal::new("depth", Direction::Up)));
    }

    #[test]
    fn add_registers_and_reports_replacement() {
        let registry = TraversalRegistry::empty();
        let traversal = Traversal::new("custom", Direction::Up);

        assert!(registry.get(&traversal).is_none());
        assert!(!registry.add("custom", Direction::Up, Arc::new(DepthDown)));
        assert!(registry.add("custom", Direction::Up, Arc::new(DepthDown)));
        assert!(registry.get(&traversal).is_some());
    }
}
