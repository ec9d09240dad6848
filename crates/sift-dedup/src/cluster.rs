//! Union-Find data structure for clustering duplicate documents.
//!
//! This module provides an efficient disjoint-set data structure with
//! path compression and union-by-rank optimizations, and the resolver that
//! turns confirmed duplicate pairs into one survivor per cluster.

use crate::lsh::DocId;
use std::collections::HashMap;

/// Union-Find (Disjoint Set Union) data structure.
///
/// Used to group documents into duplicate clusters efficiently.
/// Supports near-constant time operations via path compression and union-by-rank.
pub struct UnionFind {
    /// Parent pointers. parent[i] = j means i's parent is j.
    parent: Vec<usize>,
    /// Rank (approximate tree depth) for union-by-rank.
    rank: Vec<usize>,
}

impl UnionFind {
    /// Create a new Union-Find structure with n elements.
    ///
    /// Initially, each element is in its own singleton set.
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    /// Find the root (representative) of the set containing x.
    ///
    /// Uses path compression: all nodes on the path to root
    /// are updated to point directly to the root.
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }

        root
    }

    /// Union the sets containing x and y.
    ///
    /// Uses union-by-rank: the shorter tree is attached
    /// under the root of the taller tree.
    ///
    /// Returns true if x and y were in different sets (and are now merged).
    pub fn union(&mut self, x: usize, y: usize) -> bool {
        let rx = self.find(x);
        let ry = self.find(y);

        if rx == ry {
            return false;
        }

        match self.rank[rx].cmp(&self.rank[ry]) {
            std::cmp::Ordering::Less => self.parent[rx] = ry,
            std::cmp::Ordering::Greater => self.parent[ry] = rx,
            std::cmp::Ordering::Equal => {
                self.parent[ry] = rx;
                self.rank[rx] += 1;
            }
        }

        true
    }

    /// Check if x and y are in the same set.
    pub fn connected(&mut self, x: usize, y: usize) -> bool {
        self.find(x) == self.find(y)
    }

    /// Get all clusters as a map from root -> members.
    ///
    /// Members are listed in ascending order.
    #[must_use]
    pub fn clusters(&mut self) -> HashMap<usize, Vec<usize>> {
        let mut clusters: HashMap<usize, Vec<usize>> = HashMap::new();
        for i in 0..self.parent.len() {
            let root = self.find(i);
            clusters.entry(root).or_default().push(i);
        }
        clusters
    }

    /// Get the number of distinct sets.
    pub fn num_sets(&mut self) -> usize {
        (0..self.parent.len())
            .filter(|&i| self.find(i) == i)
            .count()
    }

    /// Get the total number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Check if the structure is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }
}

/// Clusters and survivors derived from confirmed duplicate pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterResolution {
    /// One surviving document per cluster, ascending.
    pub survivors: Vec<DocId>,
    /// Clusters with more than one member, keyed by survivor; members ascending.
    pub clusters: HashMap<DocId, Vec<DocId>>,
}

impl ClusterResolution {
    /// Number of documents that were not kept.
    #[must_use]
    pub fn removed_count(&self) -> usize {
        self.clusters.values().map(|members| members.len() - 1).sum()
    }
}

/// Resolve duplicate pairs into clusters over `num_docs` documents.
///
/// Every document starts as its own singleton cluster. The survivor of each
/// connected component is its smallest [`DocId`], so the outcome does not
/// depend on pair order.
#[must_use]
pub fn resolve_clusters(num_docs: usize, pairs: &[(DocId, DocId)]) -> ClusterResolution {
    let mut uf = UnionFind::new(num_docs);
    for &(a, b) in pairs {
        uf.union(a, b);
    }

    let mut survivors = Vec::new();
    let mut clusters = HashMap::new();

    for members in uf.clusters().into_values() {
        // Members are collected in ascending order, so the first is the minimum.
        let survivor = members[0];
        survivors.push(survivor);
        if members.len() > 1 {
            clusters.insert(survivor, members);
        }
    }

    survivors.sort_unstable();

    ClusterResolution {
        survivors,
        clusters,
    }
}
