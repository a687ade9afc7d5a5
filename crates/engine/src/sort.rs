// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Classical Kahn layering over the dependency graph declared by
//! `Resource::dependencies`. A resource's dependencies are its *parents*
//! — they must converge first.

use align_core::Resource;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("cyclic dependency among resources: {0:?}")]
pub struct CycleError(pub Vec<String>);

/// Layer `resources` by dependency order. Returns layers of indices into
/// the input slice; order within a layer is unspecified. A dependency
/// naming an id absent from `resources` is treated as already satisfied.
pub fn layer(resources: &[Arc<dyn Resource>]) -> Result<Vec<Vec<usize>>, CycleError> {
    let index_of: std::collections::HashMap<&str, usize> = resources
        .iter()
        .enumerate()
        .map(|(i, r)| (r.id(), i))
        .collect();

    let mut parents: Vec<HashSet<usize>> = resources
        .iter()
        .map(|r| {
            r.dependencies()
                .iter()
                .filter_map(|dep| index_of.get(dep.as_str()).copied())
                .collect()
        })
        .collect();

    let mut remaining: HashSet<usize> = (0..resources.len()).collect();
    let mut layers = Vec::new();

    while !remaining.is_empty() {
        let mut leaves: Vec<usize> = remaining
            .iter()
            .copied()
            .filter(|i| parents[*i].is_empty())
            .collect();

        if leaves.is_empty() {
            let mut stuck: Vec<String> = remaining.iter().map(|&i| resources[i].id().to_string()).collect();
            stuck.sort();
            return Err(CycleError(stuck));
        }

        leaves.sort_unstable();
        for &leaf in &leaves {
            remaining.remove(&leaf);
        }
        let leaf_set: HashSet<usize> = leaves.iter().copied().collect();
        for &i in &remaining {
            parents[i].retain(|p| !leaf_set.contains(p));
        }

        layers.push(leaves);
    }

    Ok(layers)
}
