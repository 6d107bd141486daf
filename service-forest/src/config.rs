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

//! Per-service options and forest-wide defaults.
//!
//! Configuration is plain serde data, usually written as json5:
//!
//! ```
//! use service_forest::{Direction, ForestConfig};
//!
//! let config = ForestConfig::from_json5_str(
//!     r#"{
//!         // matching can be switched off for every service by default
//!         service: { matching_enabled: false },
//!         publish: { strategy: "depth", direction: "down" },
//!     }"#,
//! )
//! .unwrap();
//!
//! assert!(!config.service.matching_enabled);
//! assert_eq!(config.publish.strategy, "depth");
//! assert_eq!(config.publish.direction, Direction::Down);
//! ```

use crate::error::ConfigError;
use crate::traversal::{Direction, Traversal, BREADTH};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options owned by a single service node.
#[derive(Deserialize, Serialize, Debug, Clone, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// When `false`, none of the service's subscriptions match anything.
    #[serde(default = "default_matching_enabled")]
    pub matching_enabled: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            matching_enabled: default_matching_enabled(),
        }
    }
}

/// Traversal used by `Service::publish` when none is given explicitly.
#[derive(Deserialize, Serialize, Debug, Clone, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PublishDefaults {
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default)]
    pub direction: Direction,
}

impl Default for PublishDefaults {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            direction: Direction::default(),
        }
    }
}

impl PublishDefaults {
    pub fn traversal(&self) -> Traversal {
        Traversal::new(self.strategy.clone(), self.direction)
    }
}

/// Forest-wide defaults inherited by every service that does not override them.
#[derive(Deserialize, Serialize, Debug, Clone, Default, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ForestConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub publish: PublishDefaults,
}

impl ForestConfig {
    pub fn from_json5_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(json5::from_str(contents)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json5_str(&contents)
    }
}

fn default_matching_enabled() -> bool {
    true
}

fn default_strategy() -> String {
    BREADTH.to_string()
}
