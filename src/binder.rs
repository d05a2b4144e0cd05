//! Filling realized cells with content.
//!
//! The grid decides which cell shows which item; a [`Binder`] decides what
//! the cell says. The estimation methods (`header_label`, `cell_content`, ...)
//! must return the text the matching `bind_*` call would write, since
//! layout measures them before anything is bound.

use crate::grid::Cell;
use crate::hierarchy::HierarchyNavigator;
use crate::types::TextAlignment;

pub trait Binder<N: HierarchyNavigator> {
    fn bind_row_header(&mut self, navigator: &N, item: &N::Item, cell: &mut Cell<N::Item>);

    fn unbind_row_header(&mut self, _cell: &mut Cell<N::Item>) {}

    fn bind_column_header(&mut self, navigator: &N, item: &N::Item, cell: &mut Cell<N::Item>);

    fn unbind_column_header(&mut self, _cell: &mut Cell<N::Item>) {}

    fn bind_body(
        &mut self,
        navigator: &N,
        row: &N::Item,
        column: &N::Item,
        cell: &mut Cell<N::Item>,
    );

    fn unbind_body(&mut self, _cell: &mut Cell<N::Item>) {}

    fn bind_corner(
        &mut self,
        navigator: &N,
        row_level: usize,
        column_level: usize,
        cell: &mut Cell<N::Item>,
    );

    fn unbind_corner(&mut self, _cell: &mut Cell<N::Item>) {}

    /// Bind a totals cell; `column` is None for the footer's leading header.
    fn bind_footer(&mut self, navigator: &N, column: Option<&N::Item>, cell: &mut Cell<N::Item>) {
        let text = match column {
            Some(column) => self.footer_content(navigator, column),
            None => self.footer_label(),
        };
        cell.set_text(text);
    }

    fn unbind_footer(&mut self, _cell: &mut Cell<N::Item>) {}

    fn header_label(&self, navigator: &N, item: &N::Item) -> String;

    fn cell_content(&self, navigator: &N, row: &N::Item, column: &N::Item) -> String;

    fn corner_content(&self, navigator: &N, row_level: usize, column_level: usize) -> String;

    fn footer_content(&self, _navigator: &N, _column: &N::Item) -> String {
        String::new()
    }

    fn footer_label(&self) -> String {
        "Total".to_string()
    }
}

/// Navigators that can name their members
pub trait LabelSource: HierarchyNavigator {
    fn member_label(&self, item: &Self::Item) -> String;
}

/// Writes labels and values as plain text; numbers are right-aligned.
#[derive(Debug, Clone, Default)]
pub struct TextBinder {
    /// Overrides the footer header label
    pub footer_label: Option<String>,
}

impl TextBinder {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Whether `text` reads as a number ("1,204.5", "-3", "12%", "$40")
pub fn is_numeric(text: &str) -> bool {
    let cleaned: String = text
        .trim()
        .trim_start_matches('$')
        .trim_end_matches('%')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    !cleaned.is_empty() && cleaned.parse::<f64>().is_ok()
}

fn write_value<I>(cell: &mut Cell<I>, text: String) {
    cell.alignment = if is_numeric(&text) {
        TextAlignment::Right
    } else {
        TextAlignment::Left
    };
    cell.set_text(text);
}

impl<N> Binder<N> for TextBinder
where
    N: LabelSource,
    N::Value: ToString,
{
    fn bind_row_header(&mut self, navigator: &N, item: &N::Item, cell: &mut Cell<N::Item>) {
        cell.set_text(navigator.member_label(item));
    }

    fn bind_column_header(&mut self, navigator: &N, item: &N::Item, cell: &mut Cell<N::Item>) {
        cell.set_text(navigator.member_label(item));
        cell.alignment = TextAlignment::Center;
    }

    fn bind_body(
        &mut self,
        navigator: &N,
        row: &N::Item,
        column: &N::Item,
        cell: &mut Cell<N::Item>,
    ) {
        write_value(cell, self.cell_content(navigator, row, column));
    }

    fn bind_corner(
        &mut self,
        navigator: &N,
        row_level: usize,
        column_level: usize,
        cell: &mut Cell<N::Item>,
    ) {
        cell.set_text(self.corner_content(navigator, row_level, column_level));
    }

    fn bind_footer(&mut self, navigator: &N, column: Option<&N::Item>, cell: &mut Cell<N::Item>) {
        match column {
            Some(column) => write_value(cell, self.footer_content(navigator, column)),
            None => cell.set_text(<Self as Binder<N>>::footer_label(self)),
        }
    }

    fn header_label(&self, navigator: &N, item: &N::Item) -> String {
        navigator.member_label(item)
    }

    fn cell_content(&self, navigator: &N, row: &N::Item, column: &N::Item) -> String {
        navigator
            .intersection(row, column)
            .map(|v| v.to_string())
            .unwrap_or_default()
    }

    fn corner_content(&self, navigator: &N, row_level: usize, column_level: usize) -> String {
        navigator
            .corner(row_level, column_level)
            .map(|v| v.to_string())
            .unwrap_or_default()
    }

    fn footer_content(&self, navigator: &N, column: &N::Item) -> String {
        navigator
            .footer(column)
            .map(|v| v.to_string())
            .unwrap_or_default()
    }

    fn footer_label(&self) -> String {
        self.footer_label
            .clone()
            .unwrap_or_else(|| "Total".to_string())
    }
}
