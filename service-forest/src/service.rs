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

//! Service handles: state, subscriptions, tree position and publishing.
//!
//! A [`Service`] is a lightweight handle onto a node stored in its
//! [`Forest`]. Handles are cheap to clone and compare equal when they refer to
//! the same node.
//!
//! ```
//! use serde_json::{json, Value};
//! use service_forest::{Forest, ServiceBuilder, TransformError};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let forest = Forest::new();
//! let root = forest.service("root").unwrap();
//! let child = ServiceBuilder::new("child").parent(&root).build(&forest).unwrap();
//!
//! root.subscribe("$.x", |mut data: Value| {
//!     data["touched"] = json!(true);
//!     Ok::<_, TransformError>(data)
//! })
//! .unwrap();
//!
//! let published = root.publish(json!({"x": 1})).await.unwrap();
//! assert_eq!(published, json!({"x": 1, "touched": true}));
//! assert!(child.is_leaf());
//! # });
//! ```

use crate::config::ServiceConfig;
use crate::error::{ForestError, PublishError, TransformError};
use crate::forest::{Forest, NodeKey, ServiceNode};
use crate::observability::{events, fields};
use crate::subscription::Subscription;
use crate::topic::Topic;
use crate::traversal::{self, Frontier, Next, PropagationFuture, Traversal};
use futures::FutureExt;
use serde_json::{Map, Value};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tracing::{debug, info, warn};

const COMPONENT: &str = "service";

type Model = Box<dyn FnOnce(&mut Value) + Send>;

/// Handle onto a named, stateful node of a [`Forest`].
#[derive(Clone)]
pub struct Service {
    forest: Forest,
    key: NodeKey,
    name: String,
}

impl Service {
    pub(crate) fn new(forest: Forest, key: NodeKey, name: String) -> Self {
        Self { forest, key, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The forest this service was registered in.
    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub(crate) fn key(&self) -> NodeKey {
        self.key
    }

    /// Returns `false` once the forest was cleared after this handle was created.
    pub fn is_attached(&self) -> bool {
        self.forest.inner.arena.read().node(self.key).is_some()
    }

    fn read<T>(&self, f: impl FnOnce(&ServiceNode) -> T) -> Option<T> {
        let arena = self.forest.inner.arena.read();
        arena.node(self.key).map(f)
    }

    fn write<T>(&self, f: impl FnOnce(&mut ServiceNode) -> T) -> Option<T> {
        let mut arena = self.forest.inner.arena.write();
        arena.node_mut(self.key).map(f)
    }

    fn detached(&self) -> PublishError {
        PublishError::Detached(self.name.clone())
    }

    /// Canonical value at rest. Detached services report `null`.
    pub fn state(&self) -> Value {
        self.read(|node| node.state.clone()).unwrap_or(Value::Null)
    }

    pub fn config(&self) -> Arc<ServiceConfig> {
        self.read(|node| node.config.clone())
            .unwrap_or_else(|| self.forest.inner.service_config.clone())
    }

    pub fn parent(&self) -> Option<Service> {
        let arena = self.forest.inner.arena.read();
        let parent = arena.node(self.key)?.parent?;
        Some(self.forest.handle(&arena, parent))
    }

    /// Children in the order they were related.
    pub fn children(&self) -> Vec<Service> {
        let arena = self.forest.inner.arena.read();
        let Some(node) = arena.node(self.key) else {
            return Vec::new();
        };
        node.children
            .iter()
            .map(|&child| self.forest.handle(&arena, child))
            .collect()
    }

    /// Active and paused subscriptions, in registration order.
    pub fn subscriptions(&self) -> Vec<Arc<Subscription>> {
        self.read(|node| node.subscriptions.clone())
            .unwrap_or_default()
    }

    pub fn is_root(&self) -> bool {
        self.read(|node| node.parent.is_none()).unwrap_or(true)
    }

    pub fn is_leaf(&self) -> bool {
        self.read(|node| node.children.is_empty()).unwrap_or(true)
    }

    /// Number of parent hops to the root of this service's tree.
    pub fn depth(&self) -> usize {
        let arena = self.forest.inner.arena.read();
        match arena.node(self.key) {
            Some(_) => arena.depth(self.key.index),
            None => 0,
        }
    }

    /// Every other service at the same depth, across all trees of the forest.
    pub fn siblings(&self) -> Vec<Service> {
        let arena = self.forest.inner.arena.read();
        if arena.node(self.key).is_none() {
            return Vec::new();
        }
        arena
            .at_depth(arena.depth(self.key.index))
            .into_iter()
            .filter(|&index| index != self.key.index)
            .map(|index| self.forest.handle(&arena, index))
            .collect()
    }

    /// Makes `child` a child of this service, moving it away from any previous parent.
    ///
    /// Fails without touching the forest when the edge would close a cycle.
    pub fn relate_to(&self, child: &Service) -> Result<&Self, ForestError> {
        self.forest.relate(self, child)?;
        Ok(self)
    }

    /// Relates every service in `children`, in order.
    ///
    /// Fails without touching the forest when any of the edges would close a cycle.
    pub fn relate_to_all(&self, children: &[&Service]) -> Result<&Self, ForestError> {
        self.forest.relate_all(self, children)?;
        Ok(self)
    }

    /// Subscribes `on` to publications matching `topic`.
    ///
    /// String topics that parse as a query select sub-values, anything else
    /// matches by equality.
    pub fn subscribe<F>(
        &self,
        topic: impl Into<Topic>,
        on: F,
    ) -> Result<Arc<Subscription>, ForestError>
    where
        F: Fn(Value) -> Result<Value, TransformError> + Send + Sync + 'static,
    {
        let topic = topic.into();
        let subscription = self
            .write(|node| {
                let subscription = Arc::new(Subscription::new(
                    &node.name,
                    topic,
                    Arc::new(on),
                    node.config.clone(),
                ));
                node.subscriptions.push(subscription.clone());
                subscription
            })
            .ok_or_else(|| ForestError::Detached(self.name.clone()))?;

        debug!(
            event = events::SUBSCRIPTION_ADDED,
            component = COMPONENT,
            service = %self.name,
            topic = %subscription.topic(),
            query = subscription.topic().is_query(),
            "subscription added"
        );
        Ok(subscription)
    }

    /// Subscribes `on` to every publication.
    pub fn subscribe_all<F>(&self, on: F) -> Result<Arc<Subscription>, ForestError>
    where
        F: Fn(Value) -> Result<Value, TransformError> + Send + Sync + 'static,
    {
        self.subscribe(Topic::default(), on)
    }

    /// Detaches `subscription` and deactivates it; `freeze` also locks it
    /// against later `start`/`pause` calls.
    ///
    /// Returns `false` when the subscription does not belong to this service.
    pub fn unsubscribe(&self, subscription: &Arc<Subscription>, freeze: bool) -> bool {
        let removed = self
            .write(|node| {
                let before = node.subscriptions.len();
                node.subscriptions
                    .retain(|owned| !Arc::ptr_eq(owned, subscription));
                before != node.subscriptions.len()
            })
            .unwrap_or(false);

        if removed {
            subscription.end(freeze);
            debug!(
                event = events::SUBSCRIPTION_ENDED,
                component = COMPONENT,
                service = %self.name,
                topic = %subscription.topic(),
                freeze,
                "subscription ended"
            );
        }
        removed
    }

    /// Replaces the state with `data`, then publishes it with the forest's default traversal.
    pub async fn update(&self, data: Value) -> Result<Value, PublishError> {
        self.update_with(data, self.default_traversal()).await
    }

    pub async fn update_with(
        &self,
        data: Value,
        traversal: Traversal,
    ) -> Result<Value, PublishError> {
        self.write(|node| node.state = data.clone())
            .ok_or_else(|| self.detached())?;
        self.publish_with(data, traversal).await
    }

    /// Shallow-merges the keys of an object `partial` over the state and
    /// updates with the result. Non-object partials republish the state as is.
    pub async fn merge(&self, partial: Value) -> Result<Value, PublishError> {
        self.merge_with(partial, self.default_traversal()).await
    }

    pub async fn merge_with(
        &self,
        partial: Value,
        traversal: Traversal,
    ) -> Result<Value, PublishError> {
        let state = self.state_of_attached()?;
        let merged = match partial {
            Value::Object(partial) => {
                let mut merged = match state {
                    Value::Object(state) => state,
                    _ => Map::new(),
                };
                merged.extend(partial);
                Value::Object(merged)
            }
            _ => state,
        };
        self.update_with(merged, traversal).await
    }

    /// Pushes `item` onto an array state and updates with the result.
    pub async fn append(&self, item: Value) -> Result<Value, PublishError> {
        self.append_with(item, self.default_traversal()).await
    }

    pub async fn append_with(
        &self,
        item: Value,
        traversal: Traversal,
    ) -> Result<Value, PublishError> {
        let appended = match self.state_of_attached()? {
            Value::Array(mut items) => {
                items.push(item);
                Value::Array(items)
            }
            _ => return Err(PublishError::NotACollection(self.name.clone())),
        };
        self.update_with(appended, traversal).await
    }

    fn state_of_attached(&self) -> Result<Value, PublishError> {
        self.read(|node| node.state.clone())
            .ok_or_else(|| self.detached())
    }

    fn default_traversal(&self) -> Traversal {
        self.forest.config().publish.traversal()
    }

    /// Publishes `data` from this service with the forest's default traversal.
    pub async fn publish(&self, data: Value) -> Result<Value, PublishError> {
        self.publish_with(data, self.default_traversal()).await
    }

    /// Publishes `data` from this service along `traversal`.
    ///
    /// Resolves to the value this service produced locally once every
    /// reachable service of the propagation has settled.
    pub async fn publish_with(
        &self,
        data: Value,
        traversal: Traversal,
    ) -> Result<Value, PublishError> {
        let frontier = Frontier::new();
        info!(
            event = events::PUBLISH_START,
            component = COMPONENT,
            service = %self.name,
            strategy = %traversal.strategy,
            direction = %traversal.direction,
            propagation_id = %frontier.propagation_id(),
            data = %fields::format_value_preview(&data),
            "publish started"
        );

        let result = self
            .publish_within(data, traversal, frontier.clone())
            .await;

        match &result {
            Ok(_) => info!(
                event = events::PUBLISH_FINISHED,
                component = COMPONENT,
                service = %self.name,
                propagation_id = %frontier.propagation_id(),
                visited = frontier.len(),
                "publish finished"
            ),
            Err(err) => warn!(
                event = events::PUBLISH_FINISHED,
                component = COMPONENT,
                service = %self.name,
                propagation_id = %frontier.propagation_id(),
                visited = frontier.len(),
                err = %err,
                "publish failed"
            ),
        }
        result
    }

    /// Continues a propagation that already visited the services in `frontier`.
    pub fn publish_within(
        &self,
        data: Value,
        traversal: Traversal,
        frontier: Frontier,
    ) -> PropagationFuture {
        let service = self.clone();
        async move {
            if !service.is_attached() {
                return Err(service.detached());
            }

            let next: Next = {
                let traversal = traversal.clone();
                Arc::new(move |neighbor: Service, data: Value, frontier: Frontier| {
                    neighbor.publish_within(data, traversal.clone(), frontier)
                })
            };
            let action = |data: Value| service.resolve_locally(data, &frontier);

            traversal::step(&service, &traversal, data, action, next, frontier.clone()).await
        }
        .boxed()
    }

    /// Runs every matching subscription on its own copy of `data` and keeps
    /// the first result in registration order.
    fn resolve_locally(&self, data: Value, frontier: &Frontier) -> Result<Value, PublishError> {
        let mut resolved = None;
        let mut candidates = 0usize;

        for subscription in self.subscriptions() {
            let outcome = subscription.process(data.clone(), false).map_err(|source| {
                warn!(
                    event = events::SUBSCRIPTION_TRANSFORM_FAILED,
                    component = COMPONENT,
                    service = %self.name,
                    topic = %subscription.topic(),
                    propagation_id = %frontier.propagation_id(),
                    err = %source,
                    "subscription transform failed"
                );
                PublishError::Transform {
                    service: self.name.clone(),
                    source,
                }
            })?;

            if let Some(value) = outcome {
                candidates += 1;
                resolved.get_or_insert(value);
            }
        }

        if candidates > 1 {
            warn!(
                event = events::SUBSCRIPTION_CONFLICT,
                component = COMPONENT,
                service = %self.name,
                propagation_id = %frontier.propagation_id(),
                candidates,
                "conflicting subscription results, keeping the first"
            );
        }
        Ok(resolved.unwrap_or(data))
    }
}

impl PartialEq for Service {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.forest.inner, &other.forest.inner) && self.key == other.key
    }
}

impl Eq for Service {}

impl Debug for Service {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.name)
            .field("attached", &self.is_attached())
            .finish_non_exhaustive()
    }
}

/// Collects the construction options of a service.
///
/// Registration happens in [`ServiceBuilder::build`]; without overrides the
/// state is an empty object and the config is the forest default.
pub struct ServiceBuilder {
    pub(crate) name: String,
    pub(crate) model: Option<Model>,
    pub(crate) state: Option<Value>,
    pub(crate) parent: Option<Service>,
    pub(crate) children: Vec<Service>,
    pub(crate) config: Option<ServiceConfig>,
}

impl ServiceBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: None,
            state: None,
            parent: None,
            children: Vec::new(),
            config: None,
        }
    }

    /// Initializer run once on the initial state before the service is registered.
    pub fn model(mut self, model: impl FnOnce(&mut Value) + Send + 'static) -> Self {
        self.model = Some(Box::new(model));
        self
    }

    pub fn state(mut self, state: Value) -> Self {
        self.state = Some(state);
        self
    }

    pub fn parent(mut self, parent: &Service) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    pub fn children<'a>(mut self, children: impl IntoIterator<Item = &'a Service>) -> Self {
        self.children.extend(children.into_iter().cloned());
        self
    }

    pub fn config(mut self, config: ServiceConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self, forest: &Forest) -> Result<Service, ForestError> {
        forest.register(self)
    }
}

impl Debug for ServiceBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceBuilder")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("parent", &fields::format_optional_name(self.parent.as_ref().map(Service::name)))
            .field("children", &self.children.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::ServiceBuilder;
    use crate::config::ServiceConfig;
    use crate::error::{ForestError, PublishError, TransformError};
    use crate::forest::Forest;
    use crate::traversal::Traversal;
    use serde_json::{json, Value};

    fn names(services: Vec<super::Service>) -> Vec<String> {
        services.iter().map(|s| s.name().to_string()).collect()
    }

    #[test]
    fn builder_runs_model_on_initial_state() {
        let forest = Forest::new();

        let service = ServiceBuilder::new("modelled")
            .state(json!({"count": 1}))
            .model(|state| state["seeded"] = json!(true))
            .build(&forest)
            .unwrap();

        assert_eq!(service.state(), json!({"count": 1, "seeded": true}));
    }

    #[test]
    fn builder_adopts_children() {
        let forest = Forest::new();
        let a = forest.service("a").unwrap();
        let b = forest.service("b").unwrap();

        let parent = ServiceBuilder::new("parent")
            .children([&a, &b])
            .build(&forest)
            .unwrap();

        assert_eq!(names(parent.children()), vec!["a", "b"]);
        assert_eq!(a.parent(), Some(parent.clone()));
        assert_eq!(b.depth(), 1);
    }

    #[test]
    fn config_override_applies_to_one_service() {
        let forest = Forest::new();
        let quiet = ServiceBuilder::new("quiet")
            .config(ServiceConfig {
                matching_enabled: false,
            })
            .build(&forest)
            .unwrap();
        let loud = forest.service("loud").unwrap();

        assert!(!quiet.config().matching_enabled);
        assert!(loud.config().matching_enabled);
    }

    #[test]
    fn relate_to_moves_child_between_parents() {
        let forest = Forest::new();
        let first = forest.service("first").unwrap();
        let second = forest.service("second").unwrap();
        let child = forest.service("child").unwrap();

        first.relate_to(&child).unwrap();
        second.relate_to(&child).unwrap();

        assert!(first.children().is_empty());
        assert_eq!(names(second.children()), vec!["child"]);
        assert_eq!(child.parent(), Some(second));
    }

    #[test]
    fn relate_to_self_is_a_cycle() {
        let forest = Forest::new();
        let lonely = forest.service("lonely").unwrap();

        assert_eq!(
            lonely.relate_to(&lonely).unwrap_err(),
            ForestError::CyclicRelationship {
                parent: "lonely".to_string(),
                child: "lonely".to_string(),
            }
        );
        assert!(lonely.is_root() && lonely.is_leaf());
    }

    #[test]
    fn siblings_span_every_tree() {
        let forest = Forest::new();
        let left = forest.service("left").unwrap();
        let right = forest.service("right").unwrap();
        let l1 = ServiceBuilder::new("l1").parent(&left).build(&forest).unwrap();
        ServiceBuilder::new("r1").parent(&right).build(&forest).unwrap();

        assert_eq!(names(l1.siblings()), vec!["r1"]);
        assert_eq!(names(left.siblings()), vec!["right"]);
    }

    #[test]
    fn unsubscribe_only_removes_owned_subscriptions() {
        let forest = Forest::new();
        let owner = forest.service("owner").unwrap();
        let other = forest.service("other").unwrap();
        let subscription = owner.subscribe_all(Ok::<Value, TransformError>).unwrap();

        assert!(!other.unsubscribe(&subscription, false));
        assert!(subscription.is_active());

        assert!(owner.unsubscribe(&subscription, true));
        assert!(!subscription.is_active());
        assert!(subscription.is_frozen());
        assert!(owner.subscriptions().is_empty());
    }

    #[tokio::test]
    async fn merge_shallow_merges_objects_only() {
        let forest = Forest::new();
        let service = ServiceBuilder::new("merging")
            .state(json!({"a": 1, "b": {"deep": true}}))
            .build(&forest)
            .unwrap();

        let merged = service.merge(json!({"b": 2, "c": 3})).await.unwrap();
        assert_eq!(merged, json!({"a": 1, "b": 2, "c": 3}));

        let unchanged = service.merge(json!("scalar")).await.unwrap();
        assert_eq!(unchanged, json!({"a": 1, "b": 2, "c": 3}));
        assert_eq!(service.state(), unchanged);
    }

    #[tokio::test]
    async fn append_requires_array_state() {
        let forest = Forest::new();
        let list = ServiceBuilder::new("list")
            .state(json!([1]))
            .build(&forest)
            .unwrap();
        let object = forest.service("object").unwrap();

        assert_eq!(list.append(json!(2)).await.unwrap(), json!([1, 2]));
        assert_eq!(
            object.append(json!(2)).await.unwrap_err(),
            PublishError::NotACollection("object".to_string())
        );
    }

    #[tokio::test]
    async fn first_matching_subscription_wins() {
        let forest = Forest::new();
        let service = forest.service("conflicted").unwrap();
        service
            .subscribe("$.x", |_: Value| Ok::<_, TransformError>(json!("first")))
            .unwrap();
        service
            .subscribe("$.x", |_: Value| Ok::<_, TransformError>(json!("second")))
            .unwrap();

        let result = service.publish(json!({"x": 1})).await.unwrap();

        assert_eq!(result, json!("first"));
    }

    #[tokio::test]
    async fn detached_services_refuse_updates() {
        let forest = Forest::new();
        let stale = forest.service("stale").unwrap();
        forest.clear();

        assert!(!stale.is_attached());
        assert_eq!(stale.state(), Value::Null);
        assert!(stale.is_root() && stale.is_leaf());
        assert_eq!(
            stale
                .update_with(json!(1), Traversal::depth_down())
                .await
                .unwrap_err(),
            PublishError::Detached("stale".to_string())
        );
        assert_eq!(
            stale.subscribe_all(Ok::<Value, TransformError>).unwrap_err(),
            ForestError::Detached("stale".to_string())
        );
    }
}
