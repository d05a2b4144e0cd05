//! Common test utilities: model builders, a counting binder and a recording host.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_possible_truncation,
    clippy::cast_lossless
)]

use tablix::column_width::TablixProperties;
use tablix::grid::Cell;
use tablix::host::{PersistError, ScrollEvent, VisualObjectInstance};
use tablix::{
    Axis, Binder, GridConfig, HeaderNode, HierarchyNavigator, HostServices, MatrixModel,
    MatrixNavigator, MemberId, TablixControl, TextBinder, Viewport,
};

// ============================================================================
// Models
// ============================================================================

/// Flat table with `rows` data rows and `columns` columns named `C0..`.
/// Cell text is `r{row}c{column}`.
pub fn flat_table(rows: usize, columns: usize) -> MatrixNavigator {
    let headers: Vec<String> = (0..columns).map(|c| format!("C{c}")).collect();
    let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
    let data = (0..rows)
        .map(|r| (0..columns).map(|c| format!("r{r}c{c}")).collect())
        .collect();
    MatrixNavigator::new(MatrixModel::flat_table(&header_refs, data)).unwrap()
}

/// Regions by years and quarters: columns `2023 {Q1..Q4}`, `2024 {Q1..Q4}`.
pub fn quarters_model(regions: &[&str]) -> MatrixModel {
    let year = |y: &str| {
        HeaderNode::group(
            y,
            ["Q1", "Q2", "Q3", "Q4"]
                .iter()
                .map(|q| HeaderNode::leaf(*q).with_query_name(format!("{y}-{q}")))
                .collect(),
        )
    };
    MatrixModel {
        rows: regions.iter().map(|r| HeaderNode::leaf(*r)).collect(),
        columns: vec![year("2023"), year("2024")],
        values: regions
            .iter()
            .enumerate()
            .map(|(r, _)| (0..8).map(|c| Some(format!("{}", r * 10 + c))).collect())
            .collect(),
        corner: vec![vec![String::new()], vec!["Region".to_string()]],
        footer: None,
    }
}

pub fn quarters_matrix(regions: &[&str]) -> MatrixNavigator {
    MatrixNavigator::new(quarters_model(regions)).unwrap()
}

// ============================================================================
// Binder
// ============================================================================

/// Text binder that counts binds and unbinds per cell kind.
#[derive(Debug, Default)]
pub struct CountingBinder {
    inner: TextBinder,
    pub body_binds: usize,
    pub row_header_binds: usize,
    pub column_header_binds: usize,
    pub corner_binds: usize,
    pub footer_binds: usize,
    pub unbinds: usize,
}

impl CountingBinder {
    pub fn total_binds(&self) -> usize {
        self.body_binds
            + self.row_header_binds
            + self.column_header_binds
            + self.corner_binds
            + self.footer_binds
    }

    pub fn reset_counts(&mut self) {
        *self = Self::default();
    }
}

type Nav = MatrixNavigator;

impl<N> Binder<N> for CountingBinder
where
    N: HierarchyNavigator + tablix::LabelSource,
    N::Value: ToString,
{
    fn bind_row_header(&mut self, navigator: &N, item: &N::Item, cell: &mut Cell<N::Item>) {
        self.row_header_binds += 1;
        self.inner.bind_row_header(navigator, item, cell);
    }

    fn unbind_row_header(&mut self, _cell: &mut Cell<N::Item>) {
        self.unbinds += 1;
    }

    fn bind_column_header(&mut self, navigator: &N, item: &N::Item, cell: &mut Cell<N::Item>) {
        self.column_header_binds += 1;
        self.inner.bind_column_header(navigator, item, cell);
    }

    fn unbind_column_header(&mut self, _cell: &mut Cell<N::Item>) {
        self.unbinds += 1;
    }

    fn bind_body(
        &mut self,
        navigator: &N,
        row: &N::Item,
        column: &N::Item,
        cell: &mut Cell<N::Item>,
    ) {
        self.body_binds += 1;
        self.inner.bind_body(navigator, row, column, cell);
    }

    fn unbind_body(&mut self, _cell: &mut Cell<N::Item>) {
        self.unbinds += 1;
    }

    fn bind_corner(
        &mut self,
        navigator: &N,
        row_level: usize,
        column_level: usize,
        cell: &mut Cell<N::Item>,
    ) {
        self.corner_binds += 1;
        self.inner.bind_corner(navigator, row_level, column_level, cell);
    }

    fn unbind_corner(&mut self, _cell: &mut Cell<N::Item>) {
        self.unbinds += 1;
    }

    fn bind_footer(&mut self, navigator: &N, column: Option<&N::Item>, cell: &mut Cell<N::Item>) {
        self.footer_binds += 1;
        self.inner.bind_footer(navigator, column, cell);
    }

    fn unbind_footer(&mut self, _cell: &mut Cell<N::Item>) {
        self.unbinds += 1;
    }

    fn header_label(&self, navigator: &N, item: &N::Item) -> String {
        self.inner.header_label(navigator, item)
    }

    fn cell_content(&self, navigator: &N, row: &N::Item, column: &N::Item) -> String {
        self.inner.cell_content(navigator, row, column)
    }

    fn corner_content(&self, navigator: &N, row_level: usize, column_level: usize) -> String {
        self.inner.corner_content(navigator, row_level, column_level)
    }

    fn footer_content(&self, navigator: &N, column: &N::Item) -> String {
        self.inner.footer_content(navigator, column)
    }
}

// ============================================================================
// Host
// ============================================================================

/// Host that records every callback and can be told to reject persistence.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub persisted: Vec<VisualObjectInstance>,
    pub persist_attempts: usize,
    /// Number of upcoming persistence requests to reject
    pub fail_persist: usize,
    pub resize_ends: Vec<(usize, f64)>,
    pub scroll_events: Vec<ScrollEvent>,
}

impl HostServices for RecordingHost {
    fn persist_properties(&mut self, instances: &[VisualObjectInstance]) -> Result<(), PersistError> {
        self.persist_attempts += 1;
        if self.fail_persist > 0 {
            self.fail_persist -= 1;
            return Err(PersistError("host offline".to_string()));
        }
        self.persisted.extend_from_slice(instances);
        Ok(())
    }

    fn on_column_resize_end(&mut self, column: usize, width: f64) {
        self.resize_ends.push((column, width));
    }

    fn on_viewport_changed(&mut self, event: &ScrollEvent) {
        self.scroll_events.push(*event);
    }
}

impl RecordingHost {
    /// Property bag as the host would hand it back on the next update
    pub fn echo(&self) -> TablixProperties {
        let last = self.persisted.last().expect("nothing persisted");
        let mut bag = serde_json::Map::new();
        bag.insert(
            last.object_name.clone(),
            serde_json::Value::Object(last.properties.clone()),
        );
        TablixProperties::from_property_bag(&serde_json::Value::Object(bag)).unwrap()
    }
}

// ============================================================================
// Navigator with a broken region
// ============================================================================

/// Delegates to a matrix navigator but loses row leaves from `missing_from` on.
#[derive(Debug, Clone)]
pub struct BrokenNavigator {
    pub inner: MatrixNavigator,
    pub missing_from: usize,
}

impl HierarchyNavigator for BrokenNavigator {
    type Item = MemberId;
    type Value = String;

    fn depth(&self, axis: Axis) -> usize {
        self.inner.depth(axis)
    }

    fn leaf_count(&self, axis: Axis) -> usize {
        self.inner.leaf_count(axis)
    }

    fn leaf_at(&self, axis: Axis, index: usize) -> Option<MemberId> {
        if axis == Axis::Rows && index >= self.missing_from {
            return None;
        }
        self.inner.leaf_at(axis, index)
    }

    fn parent(&self, item: &MemberId) -> Option<MemberId> {
        self.inner.parent(item)
    }

    fn children(&self, item: &MemberId) -> Vec<MemberId> {
        self.inner.children(item)
    }

    fn sibling_count(&self, item: &MemberId) -> usize {
        self.inner.sibling_count(item)
    }

    fn index(&self, item: &MemberId) -> usize {
        self.inner.index(item)
    }

    fn level(&self, item: &MemberId) -> usize {
        self.inner.level(item)
    }

    fn is_leaf(&self, item: &MemberId) -> bool {
        self.inner.is_leaf(item)
    }

    fn header_item_equals(&self, a: &MemberId, b: &MemberId) -> bool {
        self.inner.header_item_equals(a, b)
    }

    fn intersection(&self, row: &MemberId, column: &MemberId) -> Option<String> {
        self.inner.intersection(row, column)
    }

    fn corner(&self, row_level: usize, column_level: usize) -> Option<String> {
        self.inner.corner(row_level, column_level)
    }

    fn column_query_name(&self, column: &MemberId) -> Option<String> {
        self.inner.column_query_name(column)
    }
}

impl tablix::LabelSource for BrokenNavigator {
    fn member_label(&self, item: &MemberId) -> String {
        self.inner.label(item).to_string()
    }
}

// ============================================================================
// Controls
// ============================================================================

pub type TestControl<N = Nav> = TablixControl<N, CountingBinder, RecordingHost>;

pub fn control_with<N>(config: GridConfig, width: f64, height: f64) -> TestControl<N>
where
    N: HierarchyNavigator + tablix::LabelSource,
    N::Value: ToString,
{
    let mut control =
        TablixControl::new(config, CountingBinder::default(), RecordingHost::default()).unwrap();
    control.update_viewport(Viewport::new(width, height));
    control
}

/// Control at `width` x `height` with the default config
pub fn control(width: f64, height: f64) -> TestControl {
    control_with(GridConfig::default(), width, height)
}

/// Control showing `navigator`, with offsets reset
pub fn loaded(navigator: MatrixNavigator, width: f64, height: f64) -> TestControl {
    let mut control = control(width, height);
    let report = control.update_models(true, navigator, TablixProperties::default());
    assert!(report.is_completed(), "initial session failed: {report:?}");
    control
}

/// Leaf indices of the realized rows, in window order
pub fn realized_rows<N, B, H>(control: &TablixControl<N, B, H>) -> Vec<usize>
where
    N: HierarchyNavigator,
    B: Binder<N>,
    H: HostServices,
{
    control
        .grid()
        .rows()
        .iter()
        .map(|r| r.leaf_index)
        .collect()
}

/// Texts of the bound cells, sorted, for comparing realized content
pub fn bound_texts<N, B, H>(control: &TablixControl<N, B, H>) -> Vec<String>
where
    N: HierarchyNavigator,
    B: Binder<N>,
    H: HostServices,
{
    let mut texts: Vec<String> = control
        .snapshot()
        .cells
        .into_iter()
        .map(|c| format!("{:?}:{}", c.kind, c.text))
        .collect();
    texts.sort();
    texts
}

/// Run queued input and require a completed session
pub fn settle<N, B, H>(control: &mut TablixControl<N, B, H>)
where
    N: HierarchyNavigator,
    B: Binder<N>,
    H: HostServices,
{
    if let Some(report) = control.process_pending() {
        assert!(report.is_completed(), "session failed: {report:?}");
    }
}
