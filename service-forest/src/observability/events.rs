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

//! Canonical structured event names used across `service-forest`.

// Forest and relationship events.
pub const SERVICE_REGISTERED: &str = "service_registered";
pub const SERVICE_REJECTED: &str = "service_rejected";
pub const RELATIONSHIP_ESTABLISHED: &str = "relationship_established";
pub const RELATIONSHIP_REJECTED: &str = "relationship_rejected";
pub const SERVICE_REPARENTED: &str = "service_reparented";
pub const FOREST_CLEARED: &str = "forest_cleared";

// Subscription events.
pub const SUBSCRIPTION_ADDED: &str = "subscription_added";
pub const SUBSCRIPTION_ENDED: &str = "subscription_ended";
pub const SUBSCRIPTION_CONFLICT: &str = "subscription_conflict";
pub const SUBSCRIPTION_TRANSFORM_FAILED: &str = "subscription_transform_failed";

// Propagation events.
pub const PUBLISH_START: &str = "publish_start";
pub const PUBLISH_FINISHED: &str = "publish_finished";
pub const PUBLISH_BRANCH_FAILED: &str = "publish_branch_failed";
pub const TRAVERSAL_FRONTIER_SKIP: &str = "traversal_frontier_skip";
pub const TRAVERSAL_UNKNOWN: &str = "traversal_unknown";
pub const TRAVERSAL_STRATEGY_REGISTERED: &str = "traversal_strategy_registered";
