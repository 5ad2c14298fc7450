//! Mapping between problem nodes and solver-side routing indices.
//!
//! Customers occupy indices `0..N-1` (node `k` maps to index `k - 1`). Each
//! vehicle then owns one start index and one end index, both standing for the
//! depot. End indices are terminal: nothing follows them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::NodeIndex;

/// Opaque position in the solver's traversal space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoutingIndex(usize);

impl RoutingIndex {
    /// Wrap a raw index.
    #[must_use]
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// The raw index.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for RoutingIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index bookkeeping for a single-depot fleet.
///
/// # Examples
///
/// ```
/// use fleetroute_core::RoutingIndexManager;
///
/// let manager = RoutingIndexManager::new(4, 2);
/// let start = manager.start(1).expect("vehicle 1 exists");
/// assert_eq!(manager.index_to_node(start), Some(0));
/// assert_eq!(manager.size(), 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingIndexManager {
    nodes: usize,
    vehicles: usize,
}

impl RoutingIndexManager {
    /// Create a manager for `nodes` locations (depot included) and `vehicles`.
    #[must_use]
    pub const fn new(nodes: usize, vehicles: usize) -> Self {
        Self { nodes, vehicles }
    }

    /// Number of non-depot nodes.
    #[must_use]
    pub const fn customer_count(&self) -> usize {
        self.nodes.saturating_sub(1)
    }

    /// Number of vehicles.
    #[must_use]
    pub const fn vehicle_count(&self) -> usize {
        self.vehicles
    }

    /// Total number of routing indices.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.customer_count() + 2 * self.vehicles
    }

    /// Start index of `vehicle`.
    #[must_use]
    pub const fn start(&self, vehicle: usize) -> Option<RoutingIndex> {
        if vehicle < self.vehicles {
            Some(RoutingIndex(self.customer_count() + vehicle))
        } else {
            None
        }
    }

    /// End index of `vehicle`.
    #[must_use]
    pub const fn end(&self, vehicle: usize) -> Option<RoutingIndex> {
        if vehicle < self.vehicles {
            Some(RoutingIndex(self.customer_count() + self.vehicles + vehicle))
        } else {
            None
        }
    }

    /// Whether `index` is some vehicle's start.
    #[must_use]
    pub const fn is_start(&self, index: RoutingIndex) -> bool {
        let first = self.customer_count();
        index.0 >= first && index.0 < first + self.vehicles
    }

    /// Whether `index` is some vehicle's end.
    #[must_use]
    pub const fn is_end(&self, index: RoutingIndex) -> bool {
        let first = self.customer_count() + self.vehicles;
        index.0 >= first && index.0 < self.size()
    }

    /// Node represented by `index`.
    #[must_use]
    pub const fn index_to_node(&self, index: RoutingIndex) -> Option<NodeIndex> {
        if index.0 < self.customer_count() {
            Some(index.0 + 1)
        } else if index.0 < self.size() {
            Some(0)
        } else {
            None
        }
    }

    /// Index of a customer node. The depot has one index per vehicle, so it
    /// maps to `None` here; use [`Self::start`] or [`Self::end`] instead.
    #[must_use]
    pub const fn node_to_index(&self, node: NodeIndex) -> Option<RoutingIndex> {
        if node == 0 || node >= self.nodes {
            None
        } else {
            Some(RoutingIndex(node - 1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn customers_precede_vehicle_terminals() {
        let manager = RoutingIndexManager::new(3, 2);
        assert_eq!(manager.size(), 6);
        assert_eq!(manager.node_to_index(1), Some(RoutingIndex::new(0)));
        assert_eq!(manager.node_to_index(2), Some(RoutingIndex::new(1)));
        assert_eq!(manager.start(0), Some(RoutingIndex::new(2)));
        assert_eq!(manager.start(1), Some(RoutingIndex::new(3)));
        assert_eq!(manager.end(0), Some(RoutingIndex::new(4)));
        assert_eq!(manager.end(1), Some(RoutingIndex::new(5)));
        assert_eq!(manager.start(2), None);
    }

    #[rstest]
    #[case(0, Some(1))]
    #[case(1, Some(2))]
    #[case(2, Some(0))]
    #[case(5, Some(0))]
    #[case(6, None)]
    fn indices_map_back_to_nodes(#[case] raw: usize, #[case] node: Option<NodeIndex>) {
        let manager = RoutingIndexManager::new(3, 2);
        assert_eq!(manager.index_to_node(RoutingIndex::new(raw)), node);
    }

    #[rstest]
    fn depot_has_no_single_index() {
        let manager = RoutingIndexManager::new(3, 1);
        assert_eq!(manager.node_to_index(0), None);
        assert_eq!(manager.node_to_index(3), None);
    }

    #[rstest]
    fn terminals_are_classified() {
        let manager = RoutingIndexManager::new(2, 2);
        let start = manager.start(1).expect("start exists");
        let end = manager.end(0).expect("end exists");
        assert!(manager.is_start(start));
        assert!(!manager.is_end(start));
        assert!(manager.is_end(end));
        assert!(!manager.is_start(RoutingIndex::new(0)));
    }
}
