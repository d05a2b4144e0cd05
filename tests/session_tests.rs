//! Rendering sessions over large and hierarchical models.
//!
//! Default config: rows are 20 px high (16 px line plus 2 px padding
//! each side) and an empty cell is 12 px wide.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    unused_imports
)]

mod common;

use common::*;
use tablix::column_width::TablixProperties;
use tablix::layout::LayoutPhase;
use tablix::{
    Axis, CellKind, GridConfig, HeaderNode, MatrixModel, MatrixNavigator, SessionKind, SessionStatus,
    Viewport,
};

const ROW_HEIGHT: f64 = 20.0;

// ============================================================================
// Virtualization
// ============================================================================

mod virtualization_tests {
    use super::*;

    #[test]
    fn test_only_visible_rows_are_realized() {
        let control = loaded(flat_table(10_000, 3), 800.0, 420.0);
        let rows = realized_rows(&control);

        // 400 px of body holds 20 rows, plus the realization margin.
        assert!(rows.len() >= 20, "only {} rows realized", rows.len());
        assert!(rows.len() <= 23, "{} rows realized", rows.len());
        assert_eq!(rows[0], 0);
        assert_eq!(
            control.snapshot().cells_of(CellKind::Body).count(),
            rows.len() * 3
        );
    }

    #[test]
    fn test_session_measures_before_spanning() {
        let mut control = loaded(flat_table(10_000, 3), 800.0, 420.0);
        for axis in [Axis::Rows, Axis::Columns] {
            let phases = control.layout(axis).phases();
            assert_eq!(phases.first(), Some(&LayoutPhase::Realizing), "{axis:?}: {phases:?}");
            assert_eq!(phases.last(), Some(&LayoutPhase::Done), "{axis:?}: {phases:?}");
            let measuring = phases.iter().position(|p| *p == LayoutPhase::Measuring).unwrap();
            let spanning = phases.iter().position(|p| *p == LayoutPhase::Spanning).unwrap();
            assert!(measuring < spanning, "{axis:?}: {phases:?}");
        }

        // A sub-row scroll only shifts realized cells.
        control.scroll_to(Axis::Rows, 0.5);
        settle(&mut control);
        assert_eq!(
            control.layout(Axis::Rows).phases(),
            &[LayoutPhase::ScrollApply, LayoutPhase::Done]
        );
    }

    #[test]
    fn test_initial_session_reports_layout() {
        let mut control = control(800.0, 420.0);
        let report = control.update_models(true, flat_table(10_000, 3), TablixProperties::default());

        assert_eq!(report.kind, SessionKind::Structural);
        assert_eq!(report.status, SessionStatus::Completed);
        assert!(report.error.is_none());
        assert_eq!(report.realized_columns, 3);
        assert!(report.iterations >= 1);
        assert!(report.bound_cells > 0);
        assert_eq!(report.content.column_hierarchy_height, ROW_HEIGHT);
    }

    #[test]
    fn test_vertical_scrollbar_only_when_rows_overflow() {
        let control = loaded(flat_table(10_000, 3), 800.0, 420.0);
        let frame = control.frame();
        assert!(frame.vertical_scrollbar.is_some());
        assert!(frame.horizontal_scrollbar.is_none());

        let small = loaded(flat_table(3, 3), 800.0, 420.0);
        assert!(small.frame().vertical_scrollbar.is_none());
        assert_eq!(realized_rows(&small), vec![0, 1, 2]);
    }

    #[test]
    fn test_tracks_have_row_height() {
        let control = loaded(flat_table(100, 2), 400.0, 300.0);
        for row in control.grid().rows() {
            assert_eq!(row.extent(), ROW_HEIGHT);
        }
    }
}

// ============================================================================
// Scrolling
// ============================================================================

mod scroll_tests {
    use super::*;

    #[test]
    fn test_scroll_to_far_offset() {
        let mut control = loaded(flat_table(10_000, 3), 800.0, 420.0);
        assert!(control.scroll_to(Axis::Rows, 500.0));
        settle(&mut control);

        let rows = realized_rows(&control);
        assert_eq!(rows[0], 500);
        assert!(rows.len() <= 30);
        let snapshot = control.snapshot();
        let cell = snapshot.find_text("r500c0").expect("row 500 realized");
        assert_eq!(cell.rect.y, ROW_HEIGHT);
        // Row headers are 1-based row numbers.
        assert!(snapshot.find_text("501").is_some());
        assert!(snapshot.find_text("r0c0").is_none());
        assert_eq!(snapshot.row_offset, 500.0);
    }

    #[test]
    fn test_one_row_scroll_binds_one_row() {
        let mut control = loaded(flat_table(10_000, 3), 800.0, 420.0);
        control.scroll_to(Axis::Rows, 500.0);
        settle(&mut control);

        let body_before = control.binder().body_binds;
        let headers_before = control.binder().row_header_binds;
        let columns_before = control.binder().column_header_binds;
        control.scroll_by(Axis::Rows, 1.0);
        settle(&mut control);

        assert_eq!(realized_rows(&control)[0], 501);
        assert_eq!(control.binder().body_binds - body_before, 3);
        assert_eq!(control.binder().row_header_binds - headers_before, 1);
        assert_eq!(control.binder().column_header_binds, columns_before);
    }

    #[test]
    fn test_scroll_round_trip_restores_content() {
        let mut control = loaded(flat_table(10_000, 3), 800.0, 420.0);
        control.scroll_to(Axis::Rows, 500.0);
        settle(&mut control);
        let texts = bound_texts(&control);
        let rows = realized_rows(&control);

        control.scroll_by(Axis::Rows, 5.0);
        settle(&mut control);
        assert_ne!(bound_texts(&control), texts);
        control.scroll_by(Axis::Rows, -5.0);
        settle(&mut control);

        assert_eq!(bound_texts(&control), texts);
        assert_eq!(realized_rows(&control), rows);
    }

    #[test]
    fn test_fractional_offset_shifts_cells() {
        let mut control = loaded(flat_table(10_000, 3), 800.0, 420.0);
        control.scroll_to(Axis::Rows, 500.0);
        settle(&mut control);

        control.scroll_to(Axis::Rows, 500.5);
        settle(&mut control);
        let snapshot = control.snapshot();
        let cell = snapshot.find_text("r500c0").unwrap();
        assert_eq!(cell.rect.y, ROW_HEIGHT - 10.0);
        assert_eq!(realized_rows(&control)[0], 500);
    }

    #[test]
    fn test_small_fraction_change_only_moves_pixels() {
        let mut control = loaded(flat_table(10_000, 3), 800.0, 420.0);
        control.scroll_to(Axis::Rows, 500.5);
        settle(&mut control);
        let binds = control.binder().total_binds();

        control.scroll_to(Axis::Rows, 500.75);
        let report = control.process_pending().unwrap();

        assert_eq!(report.status, SessionStatus::ScrollApplied);
        assert_eq!(control.binder().total_binds(), binds);
        let snapshot = control.snapshot();
        assert_eq!(snapshot.find_text("r500c0").unwrap().rect.y, ROW_HEIGHT - 15.0);
    }

    #[test]
    fn test_scroll_past_end_clamps() {
        let mut control = loaded(flat_table(10_000, 3), 800.0, 420.0);
        control.scroll_to(Axis::Rows, 9_999.0);
        settle(&mut control);

        assert_eq!(control.dimension(Axis::Rows).scroll_offset(), 9_980.0);
        let rows = realized_rows(&control);
        assert_eq!(rows[0], 9_980);
        assert_eq!(*rows.last().unwrap(), 9_999);
        assert_eq!(rows.len(), 20);
    }

    #[test]
    fn test_taller_viewport_pulls_back_at_end() {
        let mut control = loaded(flat_table(10_000, 3), 800.0, 420.0);
        control.scroll_to(Axis::Rows, 9_999.0);
        settle(&mut control);

        let report = control.update_viewport(Viewport::new(800.0, 620.0));
        assert!(report.is_completed());

        let rows = realized_rows(&control);
        assert_eq!(rows[0], 9_970);
        assert_eq!(*rows.last().unwrap(), 9_999);
        assert_eq!(control.dimension(Axis::Rows).scroll_offset(), 9_970.0);
    }

    #[test]
    fn test_no_scroll_without_pending_input() {
        let mut control = loaded(flat_table(100, 3), 800.0, 420.0);
        assert!(!control.has_pending());
        assert!(control.process_pending().is_none());
        assert!(!control.scroll_by(Axis::Rows, 0.0));
        assert!(!control.scroll_by(Axis::Rows, f64::NAN));
    }

    #[test]
    fn test_scroll_events_reach_host() {
        let mut control = loaded(flat_table(1_000, 3), 800.0, 420.0);
        let before = control.host().scroll_events.len();
        control.scroll_to(Axis::Rows, 40.0);
        settle(&mut control);
        assert!(control.host().scroll_events.len() > before);
    }
}

// ============================================================================
// Spanning headers
// ============================================================================

mod span_tests {
    use super::*;

    fn long_year_model() -> MatrixNavigator {
        let mut model = quarters_model(&["East", "West"]);
        model.columns[0].label = "Fiscal year 2023 total revenue".to_string();
        MatrixNavigator::new(model).unwrap()
    }

    #[test]
    fn test_parent_header_spans_its_leaves() {
        let control = loaded(quarters_matrix(&["East", "West"]), 800.0, 400.0);
        let snapshot = control.snapshot();

        let year = snapshot.find_text("2023").unwrap();
        assert_eq!(year.kind, CellKind::ColumnHeader);
        assert_eq!(year.column_span, 4);
        let quarters: f64 = snapshot
            .cells_of(CellKind::ColumnHeader)
            .filter(|c| c.text.starts_with('Q') && c.rect.x < year.rect.right() - 1e-9)
            .map(|c| c.rect.width)
            .sum();
        assert!((quarters - year.rect.width).abs() < 1e-9);
        assert_eq!(control.grid().header_rows().len(), 2);
    }

    #[test]
    fn test_wide_parent_grows_last_leaf() {
        let control = loaded(long_year_model(), 1_000.0, 400.0);
        let widths: Vec<f64> = control.grid().columns().iter().map(|c| c.extent()).collect();

        // 30 characters at 7 px plus padding.
        assert_eq!(widths[0], 26.0);
        assert_eq!(widths[1], 26.0);
        assert_eq!(widths[2], 26.0);
        assert_eq!(widths[3], 222.0 - 78.0);
        assert_eq!(widths[4], 26.0);

        let snapshot = control.snapshot();
        let year = snapshot.find_text("Fiscal year 2023 total revenue").unwrap();
        assert_eq!(year.rect.width, 222.0);
    }

    #[test]
    fn test_corner_and_row_headers() {
        let control = loaded(quarters_matrix(&["East", "West"]), 800.0, 400.0);
        let snapshot = control.snapshot();

        assert_eq!(snapshot.cells_of(CellKind::Corner).count(), 2);
        let region = snapshot.find_text("Region").unwrap();
        assert_eq!(region.kind, CellKind::Corner);
        assert_eq!(region.rect.y, ROW_HEIGHT);

        let east = snapshot.find_text("East").unwrap();
        assert_eq!(east.kind, CellKind::RowHeader);
        assert_eq!(east.rect.x, 0.0);
        assert_eq!(east.rect.y, 2.0 * ROW_HEIGHT);
        // `values[1][5]` of the quarters model.
        assert_eq!(snapshot.find_text("15").unwrap().kind, CellKind::Body);
    }

    #[test]
    fn test_row_groups_span_rows() {
        let model = MatrixModel {
            rows: vec![
                HeaderNode::group(
                    "North",
                    vec![HeaderNode::leaf("Oslo"), HeaderNode::leaf("Bergen")],
                ),
                HeaderNode::group("South", vec![HeaderNode::leaf("Rome")]),
            ],
            columns: vec![HeaderNode::leaf("Sales").with_query_name("Sales")],
            values: vec![
                vec![Some("1".into())],
                vec![Some("2".into())],
                vec![Some("3".into())],
            ],
            corner: vec![vec!["Zone".into(), "City".into()]],
            footer: None,
        };
        let control = loaded(MatrixNavigator::new(model).unwrap(), 600.0, 300.0);
        let snapshot = control.snapshot();

        let north = snapshot.find_text("North").unwrap();
        assert_eq!(north.row_span, 2);
        assert_eq!(north.rect.height, 2.0 * ROW_HEIGHT);
        let oslo = snapshot.find_text("Oslo").unwrap();
        assert_eq!(oslo.rect.x, north.rect.right());
        assert_eq!(control.grid().header_columns().len(), 2);
    }

    #[test]
    fn test_shallow_leaf_spans_remaining_levels() {
        let model = MatrixModel {
            rows: vec![
                HeaderNode::group("North", vec![HeaderNode::leaf("Oslo")]),
                HeaderNode::leaf("Elsewhere"),
            ],
            columns: vec![HeaderNode::leaf("Sales").with_query_name("Sales")],
            values: vec![vec![Some("1".into())], vec![Some("2".into())]],
            corner: vec![vec!["Zone".into(), "City".into()]],
            footer: None,
        };
        let control = loaded(MatrixNavigator::new(model).unwrap(), 600.0, 300.0);
        let snapshot = control.snapshot();

        let elsewhere = snapshot.find_text("Elsewhere").unwrap();
        let oslo = snapshot.find_text("Oslo").unwrap();
        assert_eq!(elsewhere.column_span, 2);
        assert_eq!(elsewhere.rect.x, 0.0);
        assert_eq!(elsewhere.rect.right(), oslo.rect.right());
        assert_eq!(elsewhere.rect.y, oslo.rect.bottom());
    }
}

// ============================================================================
// Footer
// ============================================================================

mod footer_tests {
    use super::*;

    fn with_footer(rows: usize) -> MatrixNavigator {
        let body = (0..rows).map(|r| vec![format!("{r}"), format!("{}", r * 2)]).collect();
        let mut model = MatrixModel::flat_table(&["A", "B"], body);
        model.footer = Some(vec![Some("sum-a".into()), Some("sum-b".into())]);
        MatrixNavigator::new(model).unwrap()
    }

    #[test]
    fn test_footer_follows_last_row() {
        let control = loaded(with_footer(3), 600.0, 400.0);
        let frame = control.frame();
        assert_eq!(frame.footer_height, ROW_HEIGHT);

        let snapshot = control.snapshot();
        let sum = snapshot.find_text("sum-a").unwrap();
        assert_eq!(sum.kind, CellKind::Footer);
        // Column headers plus three rows.
        assert_eq!(sum.rect.y, 4.0 * ROW_HEIGHT);
        let label = snapshot.find_text("Total").unwrap();
        assert_eq!(label.kind, CellKind::Footer);
        assert_eq!(label.rect.x, 0.0);
    }

    #[test]
    fn test_footer_pinned_at_body_bottom() {
        let control = loaded(with_footer(1_000), 600.0, 420.0);
        let frame = control.frame();
        let snapshot = control.snapshot();
        let sum = snapshot.find_text("sum-b").unwrap();
        assert_eq!(sum.rect.y, frame.body.bottom());
        assert!(realized_rows(&control).len() < 25);
    }
}

// ============================================================================
// Failure and lifecycle
// ============================================================================

mod lifecycle_tests {
    use super::*;

    #[test]
    fn test_failed_session_keeps_last_state() {
        let navigator = BrokenNavigator {
            inner: flat_table(10_000, 3),
            missing_from: 100,
        };
        let mut control: TestControl<BrokenNavigator> =
            control_with(GridConfig::default(), 800.0, 420.0);
        let report = control.update_models(true, navigator, TablixProperties::default());
        assert!(report.is_completed());
        let texts = bound_texts(&control);
        let rows = realized_rows(&control);

        control.scroll_to(Axis::Rows, 500.0);
        let report = control.process_pending().unwrap();

        assert_eq!(report.status, SessionStatus::Aborted);
        assert!(report.error.is_some());
        assert_eq!(bound_texts(&control), texts);
        assert_eq!(realized_rows(&control), rows);
    }

    #[test]
    fn test_resize_survives_failed_session() {
        let navigator = BrokenNavigator {
            inner: flat_table(10_000, 3),
            missing_from: 100,
        };
        let mut control: TestControl<BrokenNavigator> =
            control_with(GridConfig::default(), 800.0, 420.0);
        control.update_models(true, navigator, TablixProperties::default());
        let width_of = |control: &TestControl<BrokenNavigator>| {
            control
                .grid()
                .columns()
                .iter()
                .find(|c| c.leaf_index == 1)
                .map(|c| c.extent())
                .unwrap()
        };
        let before = width_of(&control);
        let edge = control.snapshot().find_text("C1").unwrap().rect.right();

        assert!(control.on_pointer_down(edge, 10.0, 0.0));
        assert!(control.on_pointer_move(edge + 30.0, 10.0));
        control.scroll_to(Axis::Rows, 500.0);
        let report = control.process_pending().unwrap();
        assert_eq!(report.status, SessionStatus::Aborted);
        assert_eq!(width_of(&control), before);
        assert!(control.has_pending());

        control.scroll_to(Axis::Rows, 0.0);
        settle(&mut control);
        assert_eq!(width_of(&control), before + 30.0);
    }

    #[test]
    fn test_new_models_replace_content() {
        let mut control = loaded(flat_table(50, 2), 600.0, 400.0);
        control.scroll_to(Axis::Rows, 10.0);
        settle(&mut control);

        let report = control.update_models(false, flat_table(5, 4), TablixProperties::default());
        assert!(report.is_completed());
        assert_eq!(control.dimension(Axis::Rows).scroll_offset(), 0.0);
        assert_eq!(report.realized_columns, 4);
        assert!(control.snapshot().find_text("r4c3").is_some());
    }

    #[test]
    fn test_reset_offsets_on_new_models() {
        let mut control = loaded(flat_table(500, 2), 600.0, 400.0);
        control.scroll_to(Axis::Rows, 120.0);
        settle(&mut control);

        control.update_models(true, flat_table(500, 2), TablixProperties::default());
        assert_eq!(realized_rows(&control)[0], 0);
    }

    #[test]
    fn test_refresh_with_clear_rebinds() {
        let mut control = loaded(flat_table(100, 3), 600.0, 400.0);
        let texts = bound_texts(&control);
        let binds = control.binder().total_binds();

        let report = control.refresh(true);
        assert!(report.is_completed());
        assert_eq!(bound_texts(&control), texts);
        assert!(control.binder().total_binds() > binds);
    }

    #[test]
    fn test_destroyed_control_is_inert() {
        let mut control = loaded(flat_table(100, 3), 600.0, 400.0);
        control.destroy();

        assert!(control.is_destroyed());
        assert!(control.snapshot().cells.is_empty());
        let report = control.update_viewport(Viewport::new(300.0, 300.0));
        assert_eq!(report.status, SessionStatus::Skipped);
        assert!(control.process_pending().is_none());
    }

    #[test]
    fn test_invalid_viewport_is_skipped() {
        let mut control = loaded(flat_table(10, 2), 600.0, 400.0);
        let report = control.update_viewport(Viewport::new(f64::NAN, 100.0));
        assert_eq!(report.status, SessionStatus::Skipped);
        assert_eq!(control.viewport(), Viewport::new(600.0, 400.0));
    }

    #[test]
    fn test_session_without_models_is_skipped() {
        let mut control = control(600.0, 400.0);
        let report = control.refresh(false);
        assert_eq!(report.status, SessionStatus::Skipped);
    }
}
