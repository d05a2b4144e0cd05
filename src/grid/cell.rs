//! Realized cells and the arena that owns them.

use serde::Serialize;

use crate::types::{CellKind, TextAlignment};

/// Index of a cell in the [`CellArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CellId(pub(crate) usize);

impl CellId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a cell is currently bound to
#[derive(Debug, Clone, PartialEq)]
pub enum CellItem<I> {
    RowHeader(I),
    ColumnHeader(I),
    Body { row: I, column: I },
    Corner { row_level: usize, column_level: usize },
    Footer(I),
    /// Leading cell of the footer row
    FooterHeader,
}

/// The realized display primitive for one grid position.
#[derive(Debug, Clone)]
pub struct Cell<I> {
    pub kind: CellKind,
    pub item: Option<CellItem<I>>,
    /// Content written by the binder
    pub text: Option<String>,
    pub alignment: TextAlignment,
    pub column_span: usize,
    pub row_span: usize,
    /// Header level the cell starts at (header and corner cells)
    pub level: usize,
    /// Window position of the first track the cell covers
    pub position: usize,
    /// Horizontal clip offset for content scrolled partially out of view
    pub horizontal_offset: f64,
    /// Vertical clip offset for content scrolled partially out of view
    pub vertical_offset: f64,
    /// Measured content width (padding included)
    pub content_width: f64,
    /// Measured content height (padding included)
    pub content_height: f64,
    /// Bumped every time the cell is bound to a different item
    pub generation: u64,
}

impl<I> Cell<I> {
    pub fn new(kind: CellKind) -> Self {
        Self {
            kind,
            item: None,
            text: None,
            alignment: TextAlignment::default(),
            column_span: 1,
            row_span: 1,
            level: 0,
            position: 0,
            horizontal_offset: 0.0,
            vertical_offset: 0.0,
            content_width: 0.0,
            content_height: 0.0,
            generation: 0,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.item.is_some()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    pub fn set_spans(&mut self, column_span: usize, row_span: usize) {
        self.column_span = column_span.max(1);
        self.row_span = row_span.max(1);
    }

    pub fn set_offsets(&mut self, horizontal: f64, vertical: f64) {
        self.horizontal_offset = horizontal;
        self.vertical_offset = vertical;
    }

    /// Attach the cell to a new item, keeping its identity.
    pub(crate) fn attach(&mut self, kind: CellKind, item: CellItem<I>) {
        self.kind = kind;
        self.item = Some(item);
        self.generation = self.generation.wrapping_add(1);
    }

    /// Forget the bound item and everything the binder wrote.
    pub(crate) fn detach(&mut self) -> Option<CellItem<I>> {
        self.text = None;
        self.alignment = TextAlignment::default();
        self.column_span = 1;
        self.row_span = 1;
        self.level = 0;
        self.position = 0;
        self.horizontal_offset = 0.0;
        self.vertical_offset = 0.0;
        self.content_width = 0.0;
        self.content_height = 0.0;
        self.item.take()
    }
}

/// Slot storage for every cell of a grid.
///
/// Freed slots are handed out again before the arena grows, so a scrolling
/// grid settles at a fixed allocation.
#[derive(Debug, Clone)]
pub struct CellArena<I> {
    slots: Vec<Option<Cell<I>>>,
    free: Vec<usize>,
    allocated_total: usize,
}

impl<I> Default for CellArena<I> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            allocated_total: 0,
        }
    }
}

impl<I> CellArena<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, kind: CellKind) -> CellId {
        self.allocated_total += 1;
        let cell = Cell::new(kind);
        if let Some(index) = self.free.pop() {
            if let Some(slot) = self.slots.get_mut(index) {
                *slot = Some(cell);
                return CellId(index);
            }
        }
        self.slots.push(Some(cell));
        CellId(self.slots.len() - 1)
    }

    /// Return a cell's slot to the free list.
    pub fn release(&mut self, id: CellId) -> Option<Cell<I>> {
        let cell = self.slots.get_mut(id.0)?.take();
        if cell.is_some() {
            self.free.push(id.0);
        }
        cell
    }

    pub fn get(&self, id: CellId) -> Option<&Cell<I>> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: CellId) -> Option<&mut Cell<I>> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Live cells
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cells created over the arena's lifetime (reuse does not count)
    pub fn allocated_total(&self) -> usize {
        self.allocated_total
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (CellId, &Cell<I>)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_ref().map(|c| (CellId(i), c)))
    }
}
