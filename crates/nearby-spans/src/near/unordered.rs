//! Unordered proximity.
//!
//! Clauses live in an arena of cells. Two index structures run over the
//! arena: a min-heap ordered by (doc, start, end) finds the leftmost cell,
//! and a singly linked list in document order drives the catch-up skipping
//! when the cells sit in different documents.

use std::{cmp::Reverse, collections::BinaryHeap, iter};

use super::{check_clauses, min_cost};
use crate::{
    error::SpanError,
    spans::{DocId, Payload, Spans, TERMINATED},
};

/// One clause with its bookkeeping.
struct Cell {
    /// Clause iterator.
    spans: Box<dyn Spans>,
    /// Width of the clause's current match, `None` while unpositioned.
    length: Option<u32>,
    /// Next cell in the linked list.
    next: Option<usize>,
}

/// Heap key: current match of a cell, then its index.
type CellKey = Reverse<(DocId, u32, u32, usize)>;

/// Where the unordered proximity search stands between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// No clause has been advanced yet.
    Unstarted,
    /// Every clause is positioned on a match.
    Active,
    /// Some clause ran out; no further matches.
    Exhausted,
}

/// Matches where all clauses occur, in any order, with the window they
/// span wider than their combined widths by at most `slop`.
///
/// A match runs from the leftmost clause's start to the greatest clause
/// end.
pub struct UnorderedNearSpans {
    /// Cells in clause order.
    cells: Vec<Cell>,
    /// Allowed slop.
    slop: u32,
    /// Head of the linked list.
    first: Option<usize>,
    /// Tail of the linked list.
    last: Option<usize>,
    /// Min-heap over cells.
    queue: BinaryHeap<CellKey>,
    /// Sum of the widths of all cells' current matches.
    total_length: i64,
    /// Cell with the greatest (doc, end).
    max: Option<usize>,
    /// Search state.
    phase: Phase,
    /// Lowest clause cost.
    cost: u64,
}

impl UnorderedNearSpans {
    /// Creates an unordered proximity over `clauses`.
    ///
    /// Fails when fewer than two clauses are given.
    pub fn new(clauses: Vec<Box<dyn Spans>>, slop: u32) -> Result<Self, SpanError> {
        check_clauses(&clauses)?;
        let cost = min_cost(&clauses);
        let count = clauses.len();
        Ok(Self {
            cells: clauses
                .into_iter()
                .map(|spans| Cell {
                    spans,
                    length: None,
                    next: None,
                })
                .collect(),
            slop,
            first: None,
            last: None,
            queue: BinaryHeap::with_capacity(count),
            total_length: 0,
            max: None,
            phase: Phase::Unstarted,
            cost,
        })
    }

    /// Whether every clause still has matches.
    fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    /// Advances cell `idx`, by `next` or by skipping to `target`, and
    /// updates the running width total and the max cell.
    fn move_cell(&mut self, idx: usize, target: Option<DocId>) -> bool {
        let cell = &mut self.cells[idx];
        let more = match target {
            Some(target) => cell.spans.skip_to(target),
            None => cell.spans.next(),
        };
        if let Some(length) = cell.length.take() {
            self.total_length -= i64::from(length);
        }
        if more {
            let length = cell.spans.end() - cell.spans.start();
            cell.length = Some(length);
            self.total_length += i64::from(length);
            self.update_max(idx);
        }
        self.phase = if more { Phase::Active } else { Phase::Exhausted };
        more
    }

    /// Keeps `max` on the cell with the greatest (doc, end) after `moved`
    /// changed position.
    fn update_max(&mut self, moved: usize) {
        let key = |cell: &Cell| (cell.spans.doc(), cell.spans.end());
        match self.max {
            // The max cell may have moved to a smaller end in the same doc.
            Some(max) if max == moved => {
                self.max = self
                    .cells
                    .iter()
                    .enumerate()
                    .filter(|(_, cell)| cell.length.is_some())
                    .max_by_key(|(_, cell)| key(cell))
                    .map(|(i, _)| i);
            }
            Some(max) if key(&self.cells[moved]) <= key(&self.cells[max]) => {}
            _ => self.max = Some(moved),
        }
    }

    /// Heap key of cell `idx`.
    fn key(&self, idx: usize) -> CellKey {
        let spans = &self.cells[idx].spans;
        Reverse((spans.doc(), spans.start(), spans.end(), idx))
    }

    /// Leftmost cell.
    fn min(&self) -> Option<usize> {
        self.queue.peek().map(|Reverse((_, _, _, idx))| *idx)
    }

    /// Re-sorts the leftmost cell after it moved.
    fn update_top(&mut self) {
        if let Some(Reverse((_, _, _, idx))) = self.queue.pop() {
            let key = self.key(idx);
            self.queue.push(key);
        }
    }

    /// Document of cell `idx`.
    fn cell_doc(&self, idx: Option<usize>) -> DocId {
        idx.map_or(TERMINATED, |i| self.cells[i].spans.doc())
    }

    /// Appends cell `idx` to the linked list.
    fn add_to_list(&mut self, idx: usize) {
        match self.last {
            Some(last) => self.cells[last].next = Some(idx),
            None => self.first = Some(idx),
        }
        self.last = Some(idx);
        self.cells[idx].next = None;
    }

    /// Moves the head of the linked list to its tail.
    fn first_to_last(&mut self) {
        let (Some(first), Some(last)) = (self.first, self.last) else {
            return;
        };
        self.cells[last].next = Some(first);
        self.last = Some(first);
        self.first = self.cells[first].next;
        self.cells[first].next = None;
    }

    /// Rebuilds the linked list in heap order, emptying the heap.
    fn queue_to_list(&mut self) {
        self.first = None;
        self.last = None;
        while let Some(Reverse((_, _, _, idx))) = self.queue.pop() {
            self.add_to_list(idx);
        }
    }

    /// Rebuilds the heap from the linked list.
    fn list_to_queue(&mut self) {
        self.queue.clear();
        let mut cursor = self.first;
        while let Some(idx) = cursor {
            let key = self.key(idx);
            self.queue.push(key);
            cursor = self.cells[idx].next;
        }
    }

    /// Cell indexes in linked-list order.
    fn list(&self) -> impl Iterator<Item = usize> + '_ {
        let mut cursor = self.first;
        iter::from_fn(move || {
            let idx = cursor?;
            cursor = self.cells[idx].next;
            Some(idx)
        })
    }

    /// Starts every clause in clause order, by `next` or by skipping.
    fn init_list(&mut self, target: Option<DocId>) {
        self.phase = Phase::Active;
        for idx in 0..self.cells.len() {
            if !self.move_cell(idx, target) {
                return;
            }
            self.add_to_list(idx);
        }
    }

    /// Whether all cells share a document and fit the slop.
    fn at_match(&self) -> bool {
        let (Some(min), Some(max)) = (self.min(), self.max) else {
            return false;
        };
        let (min, max) = (&self.cells[min].spans, &self.cells[max].spans);
        min.doc() == max.doc()
            && i64::from(max.end()) - i64::from(min.start()) - self.total_length
                <= i64::from(self.slop)
    }

    /// Advances the leftmost cell.
    fn advance_min(&mut self) {
        if let Some(min) = self.min()
            && self.move_cell(min, None)
        {
            self.update_top();
        }
    }
}

impl Spans for UnorderedNearSpans {
    fn next(&mut self) -> bool {
        match self.phase {
            Phase::Unstarted => {
                self.init_list(None);
                self.list_to_queue();
            }
            Phase::Active => self.advance_min(),
            Phase::Exhausted => return false,
        }

        while self.is_active() {
            let mut queue_stale = false;
            if self.cell_doc(self.min()) != self.cell_doc(self.max) {
                self.queue_to_list();
                queue_stale = true;
            }
            // Skip stragglers up to the document of the last list cell.
            while self.is_active() && self.cell_doc(self.first) < self.cell_doc(self.last) {
                if let Some(first) = self.first {
                    let target = self.cell_doc(self.last);
                    self.move_cell(first, Some(target));
                }
                self.first_to_last();
                queue_stale = true;
            }
            if !self.is_active() {
                return false;
            }
            if queue_stale {
                self.list_to_queue();
            }
            if self.at_match() {
                return true;
            }
            self.advance_min();
        }
        false
    }

    fn skip_to(&mut self, target: DocId) -> bool {
        match self.phase {
            Phase::Unstarted => {
                self.init_list(Some(target));
                if self.is_active() {
                    self.list_to_queue();
                }
            }
            Phase::Active => {
                while self.is_active() && self.cell_doc(self.min()) < target {
                    if let Some(min) = self.min()
                        && self.move_cell(min, Some(target))
                    {
                        self.update_top();
                    }
                }
            }
            Phase::Exhausted => return false,
        }
        self.is_active() && (self.at_match() || self.next())
    }

    fn doc(&self) -> DocId {
        self.cell_doc(self.min())
    }

    fn start(&self) -> u32 {
        self.min().map_or(0, |i| self.cells[i].spans.start())
    }

    fn end(&self) -> u32 {
        self.max.map_or(0, |i| self.cells[i].spans.end())
    }

    fn take_payload(&mut self) -> Vec<Payload> {
        let order: Vec<usize> = self.list().collect();
        order
            .into_iter()
            .flat_map(|idx| self.cells[idx].spans.take_payload())
            .collect()
    }

    fn is_payload_available(&self) -> bool {
        self.list().any(|idx| self.cells[idx].spans.is_payload_available())
    }

    fn cost(&self) -> u64 {
        self.cost
    }
}
