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

//! Topic matching.
//!
//! A topic is classified once, when a subscription is created:
//!
//! ```
//! use serde_json::json;
//! use service_forest::Topic;
//!
//! let query = Topic::identify(json!("$.user.name"));
//! assert!(query.is_query());
//! assert_eq!(
//!     query.matches(&json!({"user": {"name": "ada"}})),
//!     vec![json!("ada")]
//! );
//!
//! let equality = Topic::identify(json!(123));
//! assert!(!equality.is_query());
//! assert_eq!(equality.matches(&json!(123)), vec![json!(123)]);
//! assert!(equality.matches(&json!("123")).is_empty());
//! ```

mod query;

pub use query::Query;

use serde_json::Value;
use std::fmt::{Display, Formatter};

/// Topic used when a subscription does not name one.
pub const WILDCARD: &str = "*";

/// Pattern a subscription matches published data against.
#[derive(Clone, Debug, PartialEq)]
pub enum Topic {
    /// Matches data equal to the key, yielding the data itself.
    Equality(Value),
    /// Selects every sub-value addressed by the query.
    Query(Query),
}

impl Topic {
    /// Classifies a raw topic value.
    ///
    /// Strings that parse as a structured query become [`Topic::Query`],
    /// every other value falls back to [`Topic::Equality`].
    pub fn identify(raw: Value) -> Self {
        if let Value::String(source) = &raw {
            if let Ok(query) = Query::parse(source) {
                return Topic::Query(query);
            }
        }
        Topic::Equality(raw)
    }

    /// Builds an equality topic without probing for query syntax.
    pub fn equality(key: Value) -> Self {
        Topic::Equality(key)
    }

    pub fn is_query(&self) -> bool {
        matches!(self, Topic::Query(_))
    }

    /// Returns the matched sub-values of `data`, empty when nothing matches.
    pub fn matches(&self, data: &Value) -> Vec<Value> {
        match self {
            Topic::Equality(key) if key == data => vec![data.clone()],
            Topic::Equality(_) => Vec::new(),
            Topic::Query(query) => query.select(data).into_iter().cloned().collect(),
        }
    }
}

impl Default for Topic {
    fn default() -> Self {
        Topic::identify(Value::String(WILDCARD.to_string()))
    }
}

impl From<&str> for Topic {
    fn from(raw: &str) -> Self {
        Topic::identify(Value::String(raw.to_string()))
    }
}

impl From<String> for Topic {
    fn from(raw: String) -> Self {
        Topic::identify(Value::String(raw))
    }
}

impl From<Value> for Topic {
    fn from(raw: Value) -> Self {
        Topic::identify(raw)
    }
}

impl Display for Topic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Topic::Equality(key) => write!(f, "{key}"),
            Topic::Query(query) => write!(f, "{query}"),
        }
    }
}
