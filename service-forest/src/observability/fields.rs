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

//! Canonical structured field keys and value-format helpers.

use serde_json::Value;

pub const EVENT: &str = "event";
pub const COMPONENT: &str = "component";
pub const SERVICE: &str = "service";
pub const PARENT: &str = "parent";
pub const CHILD: &str = "child";
pub const TOPIC: &str = "topic";
pub const STRATEGY: &str = "strategy";
pub const DIRECTION: &str = "direction";
pub const PROPAGATION_ID: &str = "propagation_id";
pub const CANDIDATES: &str = "candidates";
pub const REASON: &str = "reason";
pub const ERR: &str = "err";

pub const NONE: &str = "none";
pub const REASON_EMPTY_NAME: &str = "empty_name";
pub const REASON_DUPLICATE_NAME: &str = "duplicate_name";
const MAX_VALUE_PREVIEW: usize = 64;

/// Renders a payload for log fields, truncated to a bounded preview.
pub fn format_value_preview(value: &Value) -> String {
    let rendered = value.to_string();
    if rendered.chars().count() <= MAX_VALUE_PREVIEW {
        return rendered;
    }

    let mut preview: String = rendered.chars().take(MAX_VALUE_PREVIEW).collect();
    preview.push_str("...");
    preview
}

pub fn format_optional_name(name: Option<&str>) -> String {
    name.unwrap_or(NONE).to_string()
}

#[cfg(test)]
mod tests {
    use super::{format_optional_name, format_value_preview, NONE};
    use serde_json::json;

    #[test]
    fn short_values_render_verbatim() {
        assert_eq!(format_value_preview(&json!({"x": 1})), r#"{"x":1}"#);
    }

    #[test]
    fn long_values_are_truncated() {
        let long = json!("a".repeat(200));
        let preview = format_value_preview(&long);

        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 64 + 3);
    }

    #[test]
    fn missing_name_falls_back() {
        assert_eq!(format_optional_name(None), NONE);
        assert_eq!(format_optional_name(Some("root")), "root");
    }
}
