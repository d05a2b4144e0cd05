//! CLI tool for tablix - lays out a JSON matrix model and prints the realized grid
//!
//! Usage:
//!   tablix_cli <model.json>                          # Text grid at 800x400
//!   tablix_cli <model.json> --size 1024x600          # Custom viewport
//!   tablix_cli <model.json> --row 500 --column 3     # Scrolled
//!   tablix_cli <model.json> --properties props.json  # Persisted column widths
//!   tablix_cli <model.json> --json                   # Snapshot as JSON
//!
//! Set `RUST_LOG=tablix=debug` to trace sessions on stderr.

#![allow(clippy::exit)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::indexing_slicing)]
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use std::env;
use std::fs;
use std::io::{self, Write};

use tablix::column_width::TablixProperties;
use tablix::{Axis, GridConfig, GridSnapshot, MatrixNavigator, NullHost, TablixControl, TextBinder, Viewport};
use tracing_subscriber::EnvFilter;

struct Options {
    model_path: String,
    properties_path: Option<String>,
    width: f64,
    height: f64,
    row: f64,
    column: f64,
    json: bool,
}

fn usage() -> ! {
    eprintln!(
        "Usage: tablix_cli <model.json> [--size WxH] [--row N] [--column N] [--properties props.json] [--json]"
    );
    std::process::exit(1);
}

fn parse_args() -> Options {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage();
    }
    let mut options = Options {
        model_path: args[1].clone(),
        properties_path: None,
        width: 800.0,
        height: 400.0,
        row: 0.0,
        column: 0.0,
        json: false,
    };
    let mut i = 2;
    while i < args.len() {
        let value = args.get(i + 1);
        match (args[i].as_str(), value) {
            ("--json", _) => {
                options.json = true;
                i += 1;
                continue;
            }
            ("--size", Some(v)) => {
                let Some((w, h)) = v.split_once('x') else { usage() };
                options.width = w.parse().unwrap_or_else(|_| usage());
                options.height = h.parse().unwrap_or_else(|_| usage());
            }
            ("--row", Some(v)) => options.row = v.parse().unwrap_or_else(|_| usage()),
            ("--column", Some(v)) => options.column = v.parse().unwrap_or_else(|_| usage()),
            ("--properties", Some(v)) => options.properties_path = Some(v.clone()),
            _ => usage(),
        }
        i += 2;
    }
    options
}

/// Lay cells out on a character grid, one line per distinct cell top.
fn render_text(snapshot: &GridSnapshot, char_width: f64, line_height: f64) -> String {
    let columns = (snapshot.viewport.width / char_width).ceil() as usize;
    let lines = (snapshot.viewport.height / line_height).ceil() as usize;
    let mut canvas = vec![vec![' '; columns]; lines];
    for cell in &snapshot.cells {
        if cell.rect.y < 0.0 || cell.rect.x + cell.rect.width <= 0.0 {
            continue;
        }
        let line = (cell.rect.y / line_height).round() as usize;
        let Some(row) = canvas.get_mut(line) else {
            continue;
        };
        let start = (cell.rect.x.max(0.0) / char_width).round() as usize;
        // Leave one column gap before the next cell.
        let room = ((cell.rect.right() / char_width).round() as usize).saturating_sub(start + 1);
        for (offset, ch) in cell.text.chars().take(room).enumerate() {
            if let Some(slot) = row.get_mut(start + offset) {
                *slot = ch;
            }
        }
    }
    let mut out = String::new();
    for row in canvas {
        let line: String = row.into_iter().collect();
        let trimmed = line.trim_end();
        if !trimmed.is_empty() {
            out.push_str(trimmed);
            out.push('\n');
        }
    }
    out
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let options = parse_args();

    let model_json = match fs::read_to_string(&options.model_path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error reading {}: {}", options.model_path, e);
            std::process::exit(1);
        }
    };
    let navigator = match MatrixNavigator::from_json(&model_json) {
        Ok(n) => n,
        Err(e) => {
            eprintln!("Error loading model: {}", e);
            std::process::exit(1);
        }
    };
    let properties = match &options.properties_path {
        Some(path) => {
            let bag = fs::read_to_string(path)
                .map_err(|e| e.to_string())
                .and_then(|s| serde_json::from_str(&s).map_err(|e| e.to_string()))
                .and_then(|v| TablixProperties::from_property_bag(&v).map_err(|e| e.to_string()));
            match bag {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("Error reading {}: {}", path, e);
                    std::process::exit(1);
                }
            }
        }
        None => TablixProperties::default(),
    };

    let config = GridConfig::default();
    let char_width = config.char_width;
    let row_height = config.line_height + 2.0 * config.cell_padding_vertical;
    let mut control = match TablixControl::new(config, TextBinder::new(), NullHost) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error creating control: {}", e);
            std::process::exit(1);
        }
    };
    control.update_viewport(Viewport::new(options.width, options.height));
    let report = control.update_models(true, navigator, properties);
    if !report.is_completed() {
        eprintln!("Layout failed: {}", report.error.unwrap_or_default());
        std::process::exit(1);
    }
    control.scroll_to(Axis::Rows, options.row);
    control.scroll_to(Axis::Columns, options.column);
    if let Some(report) = control.process_pending() {
        eprintln!(
            "Realized {} rows x {} columns, bound {} cells",
            report.realized_rows, report.realized_columns, report.bound_cells
        );
    }

    let snapshot = control.snapshot();
    let output = if options.json {
        serde_json::to_string_pretty(&snapshot).unwrap()
    } else {
        render_text(&snapshot, char_width, row_height)
    };
    io::stdout().write_all(output.as_bytes()).unwrap();
    if options.json {
        println!();
    }
}
