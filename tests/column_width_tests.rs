//! Column resize, autosize toggling and width persistence through the host.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use common::*;
use tablix::column_width::{ColumnWidthObject, TablixProperties};
use tablix::{Axis, CellKind, Viewport};

/// Right edge of the header cell labelled `label`
fn header_edge(control: &TestControl, label: &str) -> f64 {
    let snapshot = control.snapshot();
    let cell = snapshot.find_text(label).expect("header realized");
    assert_eq!(cell.kind, CellKind::ColumnHeader);
    cell.rect.right()
}

fn column_width(control: &TestControl, leaf: usize) -> f64 {
    control
        .grid()
        .columns()
        .iter()
        .find(|c| c.leaf_index == leaf)
        .map(|c| c.extent())
        .expect("column realized")
}

/// Drag the right edge of column `label` by `dx` and release.
fn drag_edge(control: &mut TestControl, label: &str, dx: f64) {
    let x = header_edge(control, label);
    assert!(control.on_pointer_down(x, 10.0, 0.0));
    assert!(control.on_pointer_move(x + dx, 10.0));
    settle(control);
    assert!(control.on_pointer_up(x + dx, 10.0));
    settle(control);
}

fn rendered_widths(control: &TestControl) -> Vec<f64> {
    control.grid().columns().iter().map(|c| c.extent()).collect()
}

mod resize_tests {
    use super::*;

    #[test]
    fn test_drag_resizes_before_release() {
        let mut control = loaded(flat_table(50, 3), 800.0, 420.0);
        let before = column_width(&control, 1);
        let x = header_edge(&control, "C1");

        assert!(control.on_pointer_down(x, 10.0, 0.0));
        assert!(control.on_pointer_move(x + 30.0, 10.0));
        settle(&mut control);

        assert_eq!(column_width(&control, 1), before + 30.0);
        // Nothing is persisted while the pointer is down.
        assert!(control.host().persisted.is_empty());
        assert!(control.host().resize_ends.is_empty());
    }

    #[test]
    fn test_release_persists_once() {
        let mut control = loaded(flat_table(50, 3), 800.0, 420.0);
        let expected = column_width(&control, 1) + 30.0;
        drag_edge(&mut control, "C1", 30.0);

        assert_eq!(control.host().resize_ends, vec![(1, expected)]);
        assert_eq!(control.host().persisted.len(), 1);
        assert_eq!(control.column_widths().width_for("C1"), Some(expected));
        assert_eq!(column_width(&control, 1), expected);

        let echoed = control.host().echo();
        assert!(echoed.auto_size_column_width);
        assert!(echoed
            .column_widths
            .contains(&ColumnWidthObject {
                query_name: "C1".to_string(),
                width: Some(expected),
            }));
    }

    #[test]
    fn test_echo_keeps_width_without_new_request() {
        let mut control = loaded(flat_table(50, 3), 800.0, 420.0);
        drag_edge(&mut control, "C1", 30.0);
        let width = column_width(&control, 1);
        let echoed = control.host().echo();

        let report = control.update_models(false, flat_table(50, 3), echoed);
        assert!(report.is_completed());

        assert_eq!(column_width(&control, 1), width);
        assert!(!control.column_widths().is_dirty());
        assert_eq!(control.host().persisted.len(), 1);
    }

    #[test]
    fn test_stale_properties_do_not_undo_resize() {
        let mut control = loaded(flat_table(50, 3), 800.0, 420.0);
        drag_edge(&mut control, "C1", 30.0);
        let width = column_width(&control, 1);

        // An update that was issued before the host saw the new widths.
        control.update_models(false, flat_table(50, 3), TablixProperties::default());

        assert_eq!(column_width(&control, 1), width);
        assert!(control.column_widths().is_dirty());
    }

    #[test]
    fn test_width_never_below_minimum() {
        let mut control = loaded(flat_table(50, 3), 800.0, 420.0);
        drag_edge(&mut control, "C1", -500.0);

        let min = control.config().min_column_width;
        assert_eq!(column_width(&control, 1), min);
        assert_eq!(control.host().resize_ends[0].1, min);
    }

    #[test]
    fn test_persisted_widths_apply_on_load() {
        let mut control = control(800.0, 420.0);
        let properties = TablixProperties {
            auto_size_column_width: true,
            column_widths: vec![
                ColumnWidthObject {
                    query_name: "C2".to_string(),
                    width: Some(150.0),
                },
                ColumnWidthObject::auto("C0"),
            ],
        };
        let report = control.update_models(true, flat_table(10, 3), properties);
        assert!(report.is_completed());

        assert_eq!(column_width(&control, 2), 150.0);
        assert_ne!(column_width(&control, 0), 150.0);
        assert!(control.host().persisted.is_empty());
    }

    #[test]
    fn test_pointer_away_from_edges_does_nothing() {
        let mut control = loaded(flat_table(50, 3), 800.0, 420.0);
        let body = control.frame().body;
        assert!(!control.on_pointer_down(body.x + 3.0, body.y + 30.0, 0.0));
        assert!(!control.on_pointer_move(body.x + 50.0, body.y + 30.0));
        assert!(!control.on_pointer_up(body.x + 50.0, body.y + 30.0));
        assert!(!control.has_pending());
    }
}

mod autosize_tests {
    use super::*;

    fn manual() -> TablixProperties {
        TablixProperties {
            auto_size_column_width: false,
            column_widths: Vec::new(),
        }
    }

    #[test]
    fn test_turning_autosize_off_freezes_rendered_widths() {
        let mut control = loaded(flat_table(50, 3), 800.0, 420.0);
        let widths = rendered_widths(&control);

        control.update_models(false, flat_table(50, 3), manual());

        assert!(!control.column_widths().auto_size());
        let frozen: Vec<Option<f64>> = control
            .column_widths()
            .columns()
            .iter()
            .map(|c| c.width)
            .collect();
        assert_eq!(frozen, widths.iter().copied().map(Some).collect::<Vec<_>>());
        assert_eq!(control.host().persisted.len(), 1);
    }

    #[test]
    fn test_turning_autosize_off_freezes_unrealized_columns() {
        let mut control = loaded(flat_table(10, 60), 400.0, 300.0);
        let realized = control.grid().columns().len();
        assert!(realized < 60);
        let widths = rendered_widths(&control);

        control.update_models(false, flat_table(10, 60), manual());

        let columns = control.column_widths().columns();
        assert_eq!(columns.len(), 60);
        assert!(columns.iter().all(|c| !c.is_auto()));
        for (column, width) in columns.iter().zip(&widths) {
            assert_eq!(column.width, Some(*width));
        }
        let min = control.config().min_column_width;
        assert!(columns.iter().all(|c| c.width.unwrap() >= min));
        let persisted = control.host().echo();
        assert!(persisted.column_widths.iter().all(|c| !c.is_auto()));

        // Off-window columns render at their frozen width once scrolled in.
        control.scroll_to(Axis::Columns, 59.0);
        settle(&mut control);
        let frozen = control.column_widths().width_for("C59").unwrap();
        assert_eq!(column_width(&control, 59), frozen);
    }

    #[test]
    fn test_autosize_round_trip_restores_widths() {
        let mut control = loaded(flat_table(50, 3), 800.0, 420.0);
        let auto_widths = rendered_widths(&control);

        control.update_models(false, flat_table(50, 3), manual());
        drag_edge(&mut control, "C1", 40.0);
        assert_ne!(rendered_widths(&control), auto_widths);

        let back_on = TablixProperties {
            auto_size_column_width: true,
            column_widths: control.column_widths().columns().to_vec(),
        };
        control.update_models(false, flat_table(50, 3), back_on);

        assert_eq!(rendered_widths(&control), auto_widths);
        assert!(control.column_widths().columns().iter().all(ColumnWidthObject::is_auto));
    }
}

mod persistence_failure_tests {
    use super::*;

    #[test]
    fn test_failed_persist_retries_on_structural_session() {
        let mut control = loaded(flat_table(500, 3), 800.0, 420.0);
        control.host_mut().fail_persist = 1;
        drag_edge(&mut control, "C1", 30.0);
        assert_eq!(control.host().persist_attempts, 1);
        assert!(control.host().persisted.is_empty());
        assert!(control.column_widths().is_persist_pending());

        // Scrolling does not retry.
        control.scroll_to(Axis::Rows, 200.0);
        settle(&mut control);
        assert_eq!(control.host().persist_attempts, 1);

        let report = control.update_viewport(Viewport::new(800.0, 420.0));
        assert!(report.is_completed());
        assert_eq!(control.host().persist_attempts, 2);
        assert_eq!(control.host().persisted.len(), 1);
        assert!(!control.column_widths().is_persist_pending());
    }

    #[test]
    fn test_failed_persist_keeps_in_memory_width() {
        let mut control = loaded(flat_table(50, 3), 800.0, 420.0);
        control.host_mut().fail_persist = 5;
        let expected = column_width(&control, 1) + 30.0;
        drag_edge(&mut control, "C1", 30.0);

        assert_eq!(column_width(&control, 1), expected);
        control.update_viewport(Viewport::new(700.0, 420.0));
        assert_eq!(column_width(&control, 1), expected);
    }
}
