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

use service_forest::{Forest, Service, ServiceBuilder};

/// Registers `names` as a chain, each one the child of the previous.
#[allow(dead_code)]
pub(crate) fn make_chain(forest: &Forest, names: &[&str]) -> Vec<Service> {
    let mut chain: Vec<Service> = Vec::with_capacity(names.len());
    for name in names {
        let mut builder = ServiceBuilder::new(*name);
        if let Some(parent) = chain.last() {
            builder = builder.parent(parent);
        }
        chain.push(builder.build(forest).expect("chain service should register"));
    }
    chain
}

#[allow(dead_code)]
pub(crate) fn make_child(forest: &Forest, name: &str, parent: &Service) -> Service {
    ServiceBuilder::new(name)
        .parent(parent)
        .build(forest)
        .expect("child service should register")
}

#[allow(dead_code)]
pub(crate) fn names(services: &[Service]) -> Vec<String> {
    services
        .iter()
        .map(|service| service.name().to_string())
        .collect()
}

#[allow(dead_code)]
pub(crate) fn sorted(mut names: Vec<String>) -> Vec<String> {
    names.sort();
    names
}
