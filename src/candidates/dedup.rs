// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Near-duplicate clustering of normalized candidates.
//!
//! Workers routinely return the same real-world item several times: the web
//! worker and the places worker both find "Tsukiji Outer Market", a video
//! mentions it again with different casing. This module collapses those into
//! one representative per cluster while keeping every member's provenance.
//!
//! # Algorithm
//!
//! 1. **Exact bucket pass**: candidates with the same normalized
//!    `title|location` seed land in one bucket.
//! 2. **Fuzzy pass**: buckets are compared pairwise using Jaccard similarity
//!    over their normalized title/location tokens. Pairs at or above the
//!    threshold are unioned in a disjoint-set forest, so clustering is
//!    transitive (connected components) and independent of input order.
//! 3. **Representative selection**: highest `score`, then highest confidence
//!    rank, then earliest position in the input.
//! 4. **Merge**: the representative carries the union of all members'
//!    `sourceRefs` (deduplicated by URL, first seen wins: representative
//!    first, then alternates in input order) and the union of tags. Every
//!    member gets the cluster id.
//!
//! Clusters are emitted in order of their earliest member, and singletons are
//! clusters too, so every input candidate appears in exactly one cluster.
//!
//! **Time Complexity**: O(n + b²·t) where b = buckets, t = tokens per candidate

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

use super::model::Candidate;
use super::text::{identity_seed, jaccard, token_set};

/// A group of candidates judged to denote the same real-world item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub cluster_id: String,
    pub representative: Candidate,
    pub alternates: Vec<Candidate>,
    pub member_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DedupStats {
    pub original_count: usize,
    pub deduped_count: usize,
    pub duplicates_removed: usize,
    pub cluster_count: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DedupResult {
    pub deduped_candidates: Vec<Candidate>,
    pub clusters: Vec<Cluster>,
    pub stats: DedupStats,
}

struct Bucket {
    tokens: BTreeSet<String>,
    members: Vec<usize>,
}

/// Disjoint-set forest with path halving and union by size.
struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            size: vec![1; len],
        }
    }

    fn find(&mut self, mut node: usize) -> usize {
        while self.parent[node] != node {
            self.parent[node] = self.parent[self.parent[node]];
            node = self.parent[node];
        }
        node
    }

    fn union(&mut self, a: usize, b: usize) {
        let (mut root_a, mut root_b) = (self.find(a), self.find(b));
        if root_a == root_b {
            return;
        }
        if self.size[root_a] < self.size[root_b] {
            std::mem::swap(&mut root_a, &mut root_b);
        }
        self.parent[root_b] = root_a;
        self.size[root_a] += self.size[root_b];
    }
}

/// Cluster near-duplicate candidates and keep one representative per cluster.
///
/// An empty input is valid and yields an empty result with zeroed stats.
pub fn deduplicate(candidates: &[Candidate], similarity_threshold: f64) -> DedupResult {
    let buckets = exact_buckets(candidates);
    let components = fuzzy_components(&buckets, similarity_threshold);

    let mut clusters = Vec::with_capacity(components.len());
    for (index, members) in components.into_iter().enumerate() {
        let cluster_id = format!("cluster-{:04}", index + 1);
        clusters.push(build_cluster(cluster_id, candidates, &members));
    }

    let deduped_candidates: Vec<Candidate> =
        clusters.iter().map(|c| c.representative.clone()).collect();

    let stats = DedupStats {
        original_count: candidates.len(),
        deduped_count: deduped_candidates.len(),
        duplicates_removed: candidates.len() - deduped_candidates.len(),
        cluster_count: clusters.len(),
    };

    DedupResult {
        deduped_candidates,
        clusters,
        stats,
    }
}

fn exact_buckets(candidates: &[Candidate]) -> Vec<Bucket> {
    let mut by_seed: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<Bucket> = Vec::new();

    for (index, candidate) in candidates.iter().enumerate() {
        let location = candidate.location_text.as_deref();
        let seed = identity_seed(&candidate.title, location);
        match by_seed.get(&seed) {
            Some(&bucket) => buckets[bucket].members.push(index),
            None => {
                by_seed.insert(seed, buckets.len());
                buckets.push(Bucket {
                    tokens: token_set(&candidate.title, location),
                    members: vec![index],
                });
            }
        }
    }

    buckets
}

/// Connected components over buckets, each returned as ascending candidate
/// indices, ordered by their first member.
fn fuzzy_components(buckets: &[Bucket], similarity_threshold: f64) -> Vec<Vec<usize>> {
    let mut forest = DisjointSet::new(buckets.len());

    for i in 0..buckets.len() {
        for j in (i + 1)..buckets.len() {
            if jaccard(&buckets[i].tokens, &buckets[j].tokens) >= similarity_threshold {
                forest.union(i, j);
            }
        }
    }

    let mut by_root: HashMap<usize, Vec<usize>> = HashMap::new();
    for (bucket_index, bucket) in buckets.iter().enumerate() {
        let root = forest.find(bucket_index);
        by_root
            .entry(root)
            .or_default()
            .extend(bucket.members.iter().copied());
    }

    let mut components: Vec<Vec<usize>> = by_root
        .into_values()
        .map(|mut members| {
            members.sort_unstable();
            members
        })
        .collect();
    components.sort_by_key(|members| members[0]);
    components
}

/// Pick the member with the best (score, confidence, earliest position).
fn select_representative(candidates: &[Candidate], members: &[usize]) -> usize {
    let mut best = members[0];
    for &index in &members[1..] {
        let current = &candidates[index];
        let leader = &candidates[best];
        let better = match current.score.total_cmp(&leader.score) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => current.confidence.rank() > leader.confidence.rank(),
        };
        if better {
            best = index;
        }
    }
    best
}

fn build_cluster(cluster_id: String, candidates: &[Candidate], members: &[usize]) -> Cluster {
    let rep_index = select_representative(candidates, members);
    let merge_order = std::iter::once(rep_index).chain(members.iter().copied().filter(|&i| i != rep_index));

    let mut representative = candidates[rep_index].clone();
    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut source_refs = Vec::new();
    let mut tags: Vec<String> = Vec::new();

    for index in merge_order {
        let member = &candidates[index];
        for source in &member.source_refs {
            if seen_urls.insert(source.url.clone()) {
                source_refs.push(source.clone());
            }
        }
        for tag in &member.tags {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
    }

    representative.source_refs = source_refs;
    representative.tags = tags;
    representative.cluster_id = Some(cluster_id.clone());

    let alternates: Vec<Candidate> = members
        .iter()
        .filter(|&&i| i != rep_index)
        .map(|&i| {
            let mut alternate = candidates[i].clone();
            alternate.cluster_id = Some(cluster_id.clone());
            alternate
        })
        .collect();

    Cluster {
        cluster_id,
        representative,
        member_count: members.len(),
        alternates,
    }
}
