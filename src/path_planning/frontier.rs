//! Cost-ordered frontier of partial plans

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::path_planning::cost_model::PlanNode;

/// How nodes of equal cost are ordered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Earliest pushed first
    #[default]
    Fifo,
    /// Seeded random order
    Random,
}

#[derive(Debug)]
struct FrontierEntry {
    cost: OrderedFloat<f64>,
    covered: usize,
    rank: u64,
    node: PlanNode,
}

impl Eq for FrontierEntry {}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior; more coverage first on
        // equal cost
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| self.covered.cmp(&other.covered))
            .then_with(|| other.rank.cmp(&self.rank))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of plan nodes keyed on accumulated cost, then on covered cell
/// count (highest first). The tie-break only orders nodes whose cost and
/// covered count are both equal.
#[derive(Debug)]
pub struct Frontier {
    heap: BinaryHeap<FrontierEntry>,
    pushed: u64,
    rng: Option<StdRng>,
}

impl Frontier {
    pub fn new(tie_break: TieBreak, seed: u64) -> Self {
        let rng = match tie_break {
            TieBreak::Fifo => None,
            TieBreak::Random => Some(StdRng::seed_from_u64(seed)),
        };
        Self {
            heap: BinaryHeap::new(),
            pushed: 0,
            rng,
        }
    }

    pub fn push(&mut self, node: PlanNode) {
        let rank = match self.rng.as_mut() {
            Some(rng) => rng.gen(),
            None => self.pushed,
        };
        self.pushed += 1;
        self.heap.push(FrontierEntry {
            cost: OrderedFloat(node.cost),
            covered: node.coverage.covered_count(),
            rank,
            node,
        });
    }

    /// Remove the cheapest node
    pub fn pop(&mut self) -> Option<PlanNode> {
        self.heap.pop().map(|entry| entry.node)
    }

    pub fn peek_cost(&self) -> Option<f64> {
        self.heap.peek().map(|entry| entry.cost.into_inner())
    }

    /// `(cost, covered cells)` of the next node
    pub fn peek_key(&self) -> Option<(f64, usize)> {
        self.heap
            .peek()
            .map(|entry| (entry.cost.into_inner(), entry.covered))
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Total number of pushes so far
    pub fn pushed(&self) -> u64 {
        self.pushed
    }
}
