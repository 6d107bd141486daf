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

//! Error kinds surfaced by forest construction, relationships and propagation.

use crate::traversal::Direction;
use thiserror::Error;

/// Synchronous failures raised while building or relating services.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ForestError {
    #[error("services must have a non-empty name")]
    InvalidName,
    #[error("services must have unique names: {0}")]
    DuplicateName(String),
    #[error("relating '{parent}' -> '{child}' would create a cycle")]
    CyclicRelationship { parent: String, child: String },
    #[error("service '{0}' is not registered in this forest")]
    Detached(String),
}

/// Failures surfaced through the future returned by a publish.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PublishError {
    #[error("unknown traversal: {strategy}/{direction}")]
    UnknownTraversal {
        strategy: String,
        direction: Direction,
    },
    #[error("subscription transform failed on service '{service}': {source}")]
    Transform {
        service: String,
        #[source]
        source: TransformError,
    },
    #[error("service '{0}' holds no collection to append to")]
    NotACollection(String),
    #[error("service '{0}' is not registered in this forest")]
    Detached(String),
}

/// Error returned by a subscription transform to reject its branch.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("{message}")]
pub struct TransformError {
    message: String,
}

impl TransformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Mutation attempted on a subscription after it was frozen.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum SubscriptionError {
    #[error("subscription to '{0}' is frozen")]
    Frozen(String),
}

/// Syntax errors in a structured-query topic.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum QueryParseError {
    #[error("query is empty")]
    Empty,
    #[error("query must start with '$', '/' or be '*'")]
    MissingRoot,
    #[error("unexpected character '{found}' at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },
    #[error("unexpected end of query")]
    UnexpectedEnd,
    #[error("invalid index '{0}'")]
    InvalidIndex(String),
    #[error("slice step must not be zero")]
    ZeroStep,
}

/// Failures while loading a forest configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to parse config: {0}")]
    Parse(#[from] json5::Error),
}

#[cfg(test)]
mod tests {
    use super::{ForestError, PublishError, TransformError};
    use crate::traversal::Direction;
    use std::error::Error;

    #[test]
    fn duplicate_name_display_names_the_service() {
        let error = ForestError::DuplicateName("foo".to_string());

        assert_eq!(error.to_string(), "services must have unique names: foo");
    }

    #[test]
    fn transform_failure_exposes_source() {
        let error = PublishError::Transform {
            service: "root".to_string(),
            source: TransformError::new("boom"),
        };

        assert!(error.to_string().contains("root"));
        assert_eq!(
            error.source().map(|source| source.to_string()),
            Some("boom".to_string())
        );
    }

    #[test]
    fn unknown_traversal_display_is_stable() {
        let error = PublishError::UnknownTraversal {
            strategy: "depth".to_string(),
            direction: Direction::Up,
        };

        assert_eq!(error.to_string(), "unknown traversal: depth/up");
    }
}
