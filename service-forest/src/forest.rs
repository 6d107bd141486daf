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

//! Registry of named services and owner of the parent/child arena.
//!
//! Nodes live in a single arena and refer to each other by index, so the
//! parent back-reference never owns anything. Every mutation of the arena
//! happens under one write lock, which keeps name uniqueness, acyclicity and
//! parent/children agreement checked and applied atomically.

use crate::config::{ForestConfig, ServiceConfig};
use crate::error::ForestError;
use crate::observability::{events, fields};
use crate::service::{Service, ServiceBuilder};
use crate::subscription::Subscription;
use crate::traversal::TraversalRegistry;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tracing::{debug, info, warn};

const COMPONENT: &str = "forest";

/// Position of a node in the arena, tagged with the arena epoch it was created in.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct NodeKey {
    pub(crate) index: usize,
    pub(crate) epoch: u64,
}

pub(crate) struct ServiceNode {
    pub(crate) name: String,
    pub(crate) state: Value,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
    pub(crate) subscriptions: Vec<Arc<Subscription>>,
    pub(crate) config: Arc<ServiceConfig>,
}

#[derive(Default)]
pub(crate) struct Arena {
    epoch: u64,
    nodes: Vec<ServiceNode>,
    names: HashMap<String, usize>,
}

impl Arena {
    pub(crate) fn node(&self, key: NodeKey) -> Option<&ServiceNode> {
        if key.epoch != self.epoch {
            return None;
        }
        self.nodes.get(key.index)
    }

    pub(crate) fn node_mut(&mut self, key: NodeKey) -> Option<&mut ServiceNode> {
        if key.epoch != self.epoch {
            return None;
        }
        self.nodes.get_mut(key.index)
    }

    pub(crate) fn key(&self, index: usize) -> NodeKey {
        NodeKey {
            index,
            epoch: self.epoch,
        }
    }

    fn name_of(&self, index: usize) -> &str {
        &self.nodes[index].name
    }

    /// Returns `true` when `candidate` is `node` or one of its ancestors.
    fn is_ancestor_or_self(&self, candidate: usize, node: usize) -> bool {
        let mut current = Some(node);
        for _ in 0..=self.nodes.len() {
            match current {
                Some(index) if index == candidate => return true,
                Some(index) => current = self.nodes[index].parent,
                None => return false,
            }
        }
        false
    }

    /// Links `child` under `parent`, detaching it from any previous parent.
    ///
    /// Callers must have ruled out cycles. Returns the previous parent.
    fn link(&mut self, parent: usize, child: usize) -> Option<usize> {
        let previous = self.nodes[child].parent;
        if previous == Some(parent) {
            return None;
        }
        if let Some(previous) = previous {
            self.nodes[previous].children.retain(|&index| index != child);
        }
        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);
        previous
    }

    fn check_relation(&self, parent: usize, child: usize) -> Result<(), ForestError> {
        if self.is_ancestor_or_self(child, parent) {
            return Err(ForestError::CyclicRelationship {
                parent: self.name_of(parent).to_string(),
                child: self.name_of(child).to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn depth(&self, index: usize) -> usize {
        let mut depth = 0;
        let mut current = self.nodes[index].parent;
        while let Some(parent) = current {
            if depth >= self.nodes.len() {
                break;
            }
            depth += 1;
            current = self.nodes[parent].parent;
        }
        depth
    }

    pub(crate) fn at_depth(&self, depth: usize) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|&index| self.depth(index) == depth)
            .collect()
    }

    fn cycle_exists(&self) -> bool {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            OnStack,
            Done,
        }

        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        let roots = (0..self.nodes.len()).filter(|&index| self.nodes[index].parent.is_none());

        for root in roots {
            // (node, next child position) pairs of the live exploration path
            let mut stack = vec![(root, 0usize)];
            marks[root] = Mark::OnStack;

            while let Some((node, position)) = stack.pop() {
                let Some(&child) = self.nodes[node].children.get(position) else {
                    marks[node] = Mark::Done;
                    continue;
                };
                stack.push((node, position + 1));

                match marks[child] {
                    Mark::OnStack => return true,
                    Mark::Done => {}
                    Mark::Unvisited => {
                        marks[child] = Mark::OnStack;
                        stack.push((child, 0));
                    }
                }
            }
        }

        // Nodes no root reaches can only hang off a parent loop.
        (0..self.nodes.len()).any(|index| {
            marks[index] == Mark::Unvisited && !self.parent_chain_terminates(index)
        })
    }

    fn parent_chain_terminates(&self, index: usize) -> bool {
        let mut current = self.nodes[index].parent;
        for _ in 0..=self.nodes.len() {
            match current {
                Some(parent) => current = self.nodes[parent].parent,
                None => return true,
            }
        }
        false
    }
}

pub(crate) struct ForestInner {
    pub(crate) arena: RwLock<Arena>,
    pub(crate) strategies: TraversalRegistry,
    pub(crate) config: ForestConfig,
    pub(crate) service_config: Arc<ServiceConfig>,
}

/// A set of independent service trees sharing one name registry.
///
/// `Forest` is a cheap handle; clones refer to the same registry.
#[derive(Clone)]
pub struct Forest {
    pub(crate) inner: Arc<ForestInner>,
}

impl Default for Forest {
    fn default() -> Self {
        Self::new()
    }
}

impl Forest {
    pub fn new() -> Self {
        Self::with_config(ForestConfig::default())
    }

    pub fn with_config(config: ForestConfig) -> Self {
        let service_config = Arc::new(config.service.clone());
        Self {
            inner: Arc::new(ForestInner {
                arena: RwLock::new(Arena::default()),
                strategies: TraversalRegistry::with_defaults(),
                config,
                service_config,
            }),
        }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.inner.config
    }

    /// Traversal strategies available to publishes started in this forest.
    pub fn strategies(&self) -> &TraversalRegistry {
        &self.inner.strategies
    }

    /// Registers a service with default state, model and config.
    pub fn service(&self, name: &str) -> Result<Service, ForestError> {
        ServiceBuilder::new(name).build(self)
    }

    pub(crate) fn register(&self, builder: ServiceBuilder) -> Result<Service, ForestError> {
        let ServiceBuilder {
            name,
            model,
            state,
            parent,
            children,
            config,
        } = builder;

        if name.trim().is_empty() {
            warn!(
                event = events::SERVICE_REJECTED,
                component = COMPONENT,
                reason = fields::REASON_EMPTY_NAME,
                "service rejected"
            );
            return Err(ForestError::InvalidName);
        }
        if self.is_registered(&name) {
            return Err(self.duplicate(name));
        }

        let mut state = state.unwrap_or_else(|| Value::Object(Default::default()));
        if let Some(model) = model {
            model(&mut state);
        }
        let config = config
            .map(Arc::new)
            .unwrap_or_else(|| self.inner.service_config.clone());

        let mut arena = self.inner.arena.write();
        if arena.names.contains_key(&name) {
            drop(arena);
            return Err(self.duplicate(name));
        }

        let parent = parent
            .as_ref()
            .map(|parent| self.index_in(&arena, parent))
            .transpose()?;
        let mut child_indices = Vec::with_capacity(children.len());
        for child in &children {
            let index = self.index_in(&arena, child)?;
            if let Some(parent) = parent {
                if arena.is_ancestor_or_self(index, parent) {
                    let error = ForestError::CyclicRelationship {
                        parent: name.clone(),
                        child: arena.name_of(index).to_string(),
                    };
                    warn!(
                        event = events::RELATIONSHIP_REJECTED,
                        component = COMPONENT,
                        parent = %name,
                        child = arena.name_of(index),
                        "service rejected, children would close a cycle"
                    );
                    return Err(error);
                }
            }
            if !child_indices.contains(&index) {
                child_indices.push(index);
            }
        }

        let index = arena.nodes.len();
        arena.nodes.push(ServiceNode {
            name: name.clone(),
            state,
            parent: None,
            children: Vec::new(),
            subscriptions: Vec::new(),
            config,
        });
        arena.names.insert(name.clone(), index);

        if let Some(parent) = parent {
            arena.link(parent, index);
        }
        for child in child_indices {
            if let Some(previous) = arena.link(index, child) {
                debug!(
                    event = events::SERVICE_REPARENTED,
                    component = COMPONENT,
                    child = arena.name_of(child),
                    previous_parent = arena.name_of(previous),
                    parent = %name,
                    "child moved to new parent"
                );
            }
        }

        let key = arena.key(index);
        drop(arena);

        info!(
            event = events::SERVICE_REGISTERED,
            component = COMPONENT,
            service = %name,
            "service registered"
        );

        Ok(Service::new(self.clone(), key, name))
    }

    fn duplicate(&self, name: String) -> ForestError {
        warn!(
            event = events::SERVICE_REJECTED,
            component = COMPONENT,
            service = %name,
            reason = fields::REASON_DUPLICATE_NAME,
            "service rejected"
        );
        ForestError::DuplicateName(name)
    }

    fn index_in(&self, arena: &Arena, service: &Service) -> Result<usize, ForestError> {
        if !Arc::ptr_eq(&service.forest().inner, &self.inner) || arena.node(service.key()).is_none()
        {
            return Err(ForestError::Detached(service.name().to_string()));
        }
        Ok(service.key().index)
    }

    /// Makes `child` a child of `parent`, rejecting edges that would close a cycle.
    pub(crate) fn relate(&self, parent: &Service, child: &Service) -> Result<(), ForestError> {
        self.relate_all(parent, &[child])
    }

    /// Makes every service in `children` a child of `parent`.
    ///
    /// Every edge is checked before any is applied, so a rejected call leaves
    /// the forest untouched.
    pub(crate) fn relate_all(
        &self,
        parent: &Service,
        children: &[&Service],
    ) -> Result<(), ForestError> {
        let mut arena = self.inner.arena.write();
        let parent_index = self.index_in(&arena, parent)?;
        let child_indices = children
            .iter()
            .map(|child| self.index_in(&arena, child))
            .collect::<Result<Vec<_>, _>>()?;

        for (child, &child_index) in children.iter().zip(&child_indices) {
            if let Err(error) = arena.check_relation(parent_index, child_index) {
                warn!(
                    event = events::RELATIONSHIP_REJECTED,
                    component = COMPONENT,
                    parent = parent.name(),
                    child = child.name(),
                    "relationship would create a cycle"
                );
                return Err(error);
            }
        }

        let mut reparented = Vec::new();
        for (child, &child_index) in children.iter().zip(&child_indices) {
            if let Some(previous) = arena.link(parent_index, child_index) {
                reparented.push((child.name(), arena.name_of(previous).to_string()));
            }
        }
        drop(arena);

        for (child, previous_parent) in reparented {
            debug!(
                event = events::SERVICE_REPARENTED,
                component = COMPONENT,
                child,
                previous_parent = %previous_parent,
                parent = parent.name(),
                "child moved to new parent"
            );
        }
        for child in children {
            debug!(
                event = events::RELATIONSHIP_ESTABLISHED,
                component = COMPONENT,
                parent = parent.name(),
                child = child.name(),
                "relationship established"
            );
        }
        Ok(())
    }

    pub(crate) fn handle(&self, arena: &Arena, index: usize) -> Service {
        Service::new(self.clone(), arena.key(index), arena.name_of(index).to_string())
    }

    fn handles(&self, select: impl Fn(&Arena) -> Vec<usize>) -> Vec<Service> {
        let arena = self.inner.arena.read();
        select(&arena)
            .into_iter()
            .map(|index| self.handle(&arena, index))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<Service> {
        let arena = self.inner.arena.read();
        arena
            .names
            .get(name)
            .map(|&index| self.handle(&arena, index))
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.inner.arena.read().names.contains_key(name)
    }

    /// Snapshot of every registered service, keyed by name.
    pub fn services(&self) -> BTreeMap<String, Service> {
        self.handles(|arena| (0..arena.nodes.len()).collect())
            .into_iter()
            .map(|service| (service.name().to_string(), service))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.arena.read().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Services without a parent, in registration order.
    pub fn find_roots(&self) -> Vec<Service> {
        self.handles(|arena| {
            (0..arena.nodes.len())
                .filter(|&index| arena.nodes[index].parent.is_none())
                .collect()
        })
    }

    /// Services without children, in registration order.
    pub fn find_leafs(&self) -> Vec<Service> {
        self.handles(|arena| {
            (0..arena.nodes.len())
                .filter(|&index| arena.nodes[index].children.is_empty())
                .collect()
        })
    }

    /// Services whose distance to their root equals `depth`, across every tree.
    pub fn find_at_depth(&self, depth: usize) -> Vec<Service> {
        self.handles(|arena| arena.at_depth(depth))
    }

    pub fn cycle_exists(&self) -> bool {
        self.inner.arena.read().cycle_exists()
    }

    /// Drops every registered service. Handles created earlier become detached.
    pub fn clear(&self) {
        let mut arena = self.inner.arena.write();
        let removed = arena.nodes.len();
        arena.nodes.clear();
        arena.names.clear();
        arena.epoch += 1;
        drop(arena);

        info!(
            event = events::FOREST_CLEARED,
            component = COMPONENT,
            removed,
            "forest cleared"
        );
    }
}

impl Debug for Forest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forest")
            .field("services", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::Forest;
    use crate::error::ForestError;
    use crate::service::ServiceBuilder;

    #[test]
    fn names_are_unique() {
        let forest = Forest::new();

        assert!(forest.service("foo").is_ok());
        assert_eq!(
            forest.service("foo").unwrap_err(),
            ForestError::DuplicateName("foo".to_string())
        );
        assert_eq!(forest.len(), 1);
    }

    #[test]
    fn empty_names_are_invalid() {
        let forest = Forest::new();

        assert_eq!(forest.service("").unwrap_err(), ForestError::InvalidName);
        assert_eq!(forest.service("  ").unwrap_err(), ForestError::InvalidName);
        assert!(forest.is_empty());
    }

    #[test]
    fn independent_forests_do_not_share_names() {
        let left = Forest::new();
        let right = Forest::new();

        assert!(left.service("shared").is_ok());
        assert!(right.service("shared").is_ok());
    }

    #[test]
    fn roots_and_leafs_follow_registration_order() {
        let forest = Forest::new();
        let a = forest.service("a").unwrap();
        let b = forest.service("b").unwrap();
        ServiceBuilder::new("c").parent(&a).build(&forest).unwrap();
        ServiceBuilder::new("d").parent(&b).build(&forest).unwrap();

        let roots: Vec<_> = forest.find_roots().iter().map(|s| s.name().to_string()).collect();
        let leafs: Vec<_> = forest.find_leafs().iter().map(|s| s.name().to_string()).collect();

        assert_eq!(roots, vec!["a", "b"]);
        assert_eq!(leafs, vec!["c", "d"]);
    }

    #[test]
    fn cycle_check_distinguishes_shared_from_cyclic_paths() {
        let forest = Forest::new();
        let root = forest.service("root").unwrap();
        let child = ServiceBuilder::new("child").parent(&root).build(&forest).unwrap();
        assert!(!forest.cycle_exists());

        // A child listed twice is explored twice but is not a cycle.
        {
            let mut arena = forest.inner.arena.write();
            let child_index = child.key().index;
            arena.nodes[root.key().index].children.push(child_index);
        }
        assert!(!forest.cycle_exists());

        {
            let mut arena = forest.inner.arena.write();
            let root_index = root.key().index;
            arena.nodes[child.key().index].children.push(root_index);
        }
        assert!(forest.cycle_exists());
    }

    #[test]
    fn cycle_check_finds_loops_unreachable_from_roots() {
        let forest = Forest::new();
        let a = forest.service("a").unwrap();
        let b = forest.service("b").unwrap();

        {
            let mut arena = forest.inner.arena.write();
            let (a, b) = (a.key().index, b.key().index);
            arena.nodes[a].parent = Some(b);
            arena.nodes[b].parent = Some(a);
            arena.nodes[a].children.push(b);
            arena.nodes[b].children.push(a);
        }

        assert!(forest.find_roots().is_empty());
        assert!(forest.cycle_exists());
    }

    #[test]
    fn clear_detaches_existing_handles() {
        let forest = Forest::new();
        let old = forest.service("old").unwrap();

        forest.clear();

        assert!(forest.is_empty());
        assert!(!forest.is_registered("old"));
        assert!(forest.service("old").is_ok());
        assert_eq!(
            ServiceBuilder::new("new").parent(&old).build(&forest).unwrap_err(),
            ForestError::Detached("old".to_string())
        );
    }

    #[test]
    fn services_snapshot_is_keyed_by_name() {
        let forest = Forest::new();
        forest.service("b").unwrap();
        forest.service("a").unwrap();

        let names: Vec<_> = forest.services().into_keys().collect();

        assert_eq!(names, vec!["a", "b"]);
        assert!(forest.get("a").is_some());
        assert!(forest.get("z").is_none());
    }
}
