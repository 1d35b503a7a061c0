//! # Chart
//!
//! The dynamic-programming table shared by every inference strategy.
//!
//! ## Key Concepts
//!
//! - **Span**: An inclusive word range `start..=end`
//! - **Cell**: The entries of one span, best first
//! - **ChartEntry**: One hypothesis for a span, with integer backpointers
//!   into the cells of its children
//! - **Beam**: A bounded min-heap used to keep the best entries of a cell
//!
//! Cells are filled once and then frozen; backpointer indices refer to the
//! frozen order. The only exception is [`Chart::push_entry`], which appends
//! and therefore never invalidates an index.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

use ccg_core::{
    CategoryId, DependencyStructure, IndexedPredicate, LexiconEntry, MoveId, UnaryId,
    UnfilledDependency,
};

// ============================================================================
// Beam
// ============================================================================

struct Scored<T> {
    probability: f64,
    sequence: u64,
    item: T,
}

impl<T> PartialEq for Scored<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Scored<T> {}

impl<T> PartialOrd for Scored<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Scored<T> {
    /// Greater means worse: lower probability, then later insertion.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .probability
            .total_cmp(&self.probability)
            .then(self.sequence.cmp(&other.sequence))
    }
}

/// A bounded collection keeping the highest-probability items.
///
/// Insertion is `O(log capacity)`. Past capacity the lowest-probability item
/// is evicted; among equal probabilities the earliest insertion survives.
/// Items with non-positive probability are rejected.
pub struct Beam<T> {
    capacity: Option<usize>,
    heap: BinaryHeap<Scored<T>>,
    next_sequence: u64,
}

impl<T> Beam<T> {
    /// A beam holding at most `capacity` items, or unbounded for `None`.
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::new(),
            next_sequence: 0,
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Lowest probability currently held.
    pub fn min_probability(&self) -> Option<f64> {
        self.heap.peek().map(|s| s.probability)
    }

    /// Offer an item; returns whether it was kept.
    pub fn offer(&mut self, probability: f64, item: T) -> bool {
        if probability.is_nan() || probability <= 0.0 || self.capacity == Some(0) {
            return false;
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        if let Some(capacity) = self.capacity {
            if self.heap.len() >= capacity {
                match self.heap.peek() {
                    Some(worst) if probability > worst.probability => {
                        self.heap.pop();
                    }
                    _ => return false,
                }
            }
        }
        self.heap.push(Scored {
            probability,
            sequence,
            item,
        });
        true
    }

    /// Items from best to worst.
    pub fn into_sorted_vec(self) -> Vec<T> {
        // Ascending by `Ord` is best first.
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|s| s.item)
            .collect()
    }
}

impl<T> Default for Beam<T> {
    fn default() -> Self {
        Self::new(None)
    }
}

// ============================================================================
// Entries
// ============================================================================

/// Address of an entry: its span and its index in the span's cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryPointer {
    pub start: usize,
    pub end: usize,
    pub index: usize,
}

impl EntryPointer {
    pub fn new(start: usize, end: usize, index: usize) -> Self {
        Self { start, end, index }
    }
}

/// How an entry was built.
#[derive(Debug, Clone, PartialEq)]
pub enum Backpointer {
    /// A lexicon entry over the entry's own span.
    Terminal {
        entry: Arc<LexiconEntry>,
        lexical_probability: f64,
    },
    /// Two child entries combined by a search move.
    Binary {
        left: EntryPointer,
        right: EntryPointer,
        search_move: MoveId,
    },
}

/// One hypothesis for a span.
///
/// Variables in `assignments` and `unfilled` refer to `category`. A root
/// entry rewritten by a unary rule has `category` set to the rule's result.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartEntry {
    pub category: CategoryId,
    pub root_unary: Option<UnaryId>,
    pub assignments: Vec<(i32, IndexedPredicate)>,
    pub unfilled: Vec<UnfilledDependency>,
    /// Dependencies first filled at this entry.
    pub filled: Vec<DependencyStructure>,
    pub backpointer: Backpointer,
    /// Probability of the whole subtree rooted here.
    pub probability: f64,
}

impl ChartEntry {
    /// Predicates assigned to a variable of this entry's category.
    pub fn predicates_for(&self, var: i32) -> impl Iterator<Item = &IndexedPredicate> + '_ {
        self.assignments
            .iter()
            .filter(move |(v, _)| *v == var)
            .map(|(_, p)| p)
    }
}

// ============================================================================
// Chart
// ============================================================================

/// A triangular table of cells over a sentence.
#[derive(Debug, Clone)]
pub struct Chart {
    num_words: usize,
    beam_size: Option<usize>,
    cells: Vec<Vec<ChartEntry>>,
    root: Vec<ChartEntry>,
    num_entries: usize,
}

impl Chart {
    /// An empty chart whose cells hold at most `beam_size` entries.
    pub fn new(num_words: usize, beam_size: Option<usize>) -> Self {
        Self {
            num_words,
            beam_size,
            cells: vec![Vec::new(); num_words * num_words],
            root: Vec::new(),
            num_entries: 0,
        }
    }

    pub fn num_words(&self) -> usize {
        self.num_words
    }

    pub fn beam_size(&self) -> Option<usize> {
        self.beam_size
    }

    /// Total entries across all cells.
    pub fn num_entries(&self) -> usize {
        self.num_entries
    }

    fn cell_index(&self, start: usize, end: usize) -> Option<usize> {
        (start <= end && end < self.num_words).then(|| start * self.num_words + end)
    }

    /// Entries of the span `start..=end`, best first.
    pub fn entries(&self, start: usize, end: usize) -> &[ChartEntry] {
        self.cell_index(start, end)
            .map(|i| self.cells[i].as_slice())
            .unwrap_or(&[])
    }

    pub fn entry(&self, pointer: EntryPointer) -> Option<&ChartEntry> {
        self.entries(pointer.start, pointer.end).get(pointer.index)
    }

    /// Replace a cell with entries sorted best first, truncated to the beam.
    pub fn set_entries(&mut self, start: usize, end: usize, mut entries: Vec<ChartEntry>) {
        let Some(index) = self.cell_index(start, end) else {
            return;
        };
        if let Some(beam_size) = self.beam_size {
            entries.truncate(beam_size);
        }
        self.num_entries = self.num_entries + entries.len() - self.cells[index].len();
        self.cells[index] = entries;
    }

    /// Append an entry without reordering; returns its pointer.
    ///
    /// Existing pointers stay valid, so nothing is evicted: once a cell holds
    /// `beam_size` entries, further entries are rejected.
    pub fn push_entry(&mut self, start: usize, end: usize, entry: ChartEntry) -> Option<EntryPointer> {
        let index = self.cell_index(start, end)?;
        if self.beam_size.is_some_and(|beam_size| self.cells[index].len() >= beam_size) {
            return None;
        }
        self.cells[index].push(entry);
        self.num_entries += 1;
        Some(EntryPointer::new(start, end, self.cells[index].len() - 1))
    }

    /// Whole-sentence entries after root weighting, best first.
    pub fn root_entries(&self) -> &[ChartEntry] {
        &self.root
    }

    pub fn set_root_entries(&mut self, entries: Vec<ChartEntry>) {
        self.root = entries;
    }

    /// Probability of the best root entry.
    pub fn best_root_probability(&self) -> Option<f64> {
        self.root.first().map(|e| e.probability)
    }
}
