use anyhow::Result;
use serde_json::{json, Value};

use overlaykit::{
    grid::{text_row, ExportContext, ExportFormat, SortDirection},
    CellValue, Grid, GridOptions,
};

fn grid(headers: &[&str], rows: &[&[&str]]) -> Grid {
    Grid::new(
        headers.iter().map(|h| h.to_string()).collect(),
        rows.iter().map(|row| text_row(row.iter().copied())).collect(),
        GridOptions::default().searchable(true),
    )
}

fn sorted(mut values: Vec<String>) -> Vec<String> {
    values.sort();
    values
}

fn column(grid: &Grid, position: usize) -> Vec<String> {
    grid.export_table()
        .1
        .into_iter()
        .map(|row| row[position].clone())
        .collect()
}

#[test]
fn test_empty_grid() {
    let grid = Grid::new(vec!["A".into()], Vec::new(), GridOptions::default());
    assert!(grid.is_empty());
    assert_eq!(grid.total_count(), 0);
    assert_eq!(grid.preferred_height(), 1);
    let layout = grid.layout(ratatui::layout::Rect::new(0, 0, 20, 5));
    assert!(layout.empty.is_some());
    assert!(layout.columns.is_empty());
}

#[test]
fn test_numeric_sort() {
    let mut grid = grid(&["Count"], &[&["10"], &["2"], &["1.5"], &["n/a"]]);
    grid.click_header(0);
    assert_eq!(column(&grid, 0), vec!["1.5", "2", "10", "n/a"]);
}

#[test]
fn test_sort_keeps_rows_and_is_stable() {
    let rows: &[&[&str]] = &[&["b", "1"], &["a", "2"], &["B", "3"], &["a", "4"]];
    let mut grid = grid(&["Key", "Seq"], rows);
    let before = sorted(column(&grid, 1));

    grid.click_header(0);
    assert_eq!(grid.sort_key().map(|key| key.direction), Some(SortDirection::Ascending));
    // Equal keys keep their original relative order.
    assert_eq!(column(&grid, 1), vec!["2", "4", "1", "3"]);
    assert_eq!(sorted(column(&grid, 1)), before);

    grid.click_header(0);
    assert_eq!(grid.sort_key().map(|key| key.direction), Some(SortDirection::Descending));
    assert_eq!(sorted(column(&grid, 1)), before);
}

#[test]
fn test_sort_twice_same_direction_is_idempotent() {
    let rows: &[&[&str]] = &[&["c"], &["a"], &["b"]];
    let mut once = grid(&["K"], rows);
    once.click_header(0);
    let mut thrice = grid(&["K"], rows);
    thrice.click_header(0);
    thrice.click_header(0);
    thrice.click_header(0);
    assert_eq!(column(&once, 0), column(&thrice, 0));
}

#[test]
fn test_reorder_keeps_cells_with_headers() {
    let mut grid = grid(&["A", "B", "C"], &[&["a1", "b1", "c1"], &["a2", "b2", "c2"]]);
    assert!(grid.move_column(0, 2));
    assert_eq!(grid.display_headers(), vec!["B", "C", "A"]);
    let (headers, rows) = grid.export_table();
    for row in &rows {
        for (header, cell) in headers.iter().zip(row) {
            assert!(cell.starts_with(&header.to_lowercase()));
        }
    }
    assert!(!grid.move_column(0, 3));
    assert!(!grid.move_column(1, 1));
}

#[test]
fn test_filter_is_monotonic() {
    let mut grid = grid(
        &["Name", "City"],
        &[&["Ann", "Oslo"], &["Bob", "Osaka"], &["Cid", "Lima"]],
    );
    let mut previous = grid.visible_count();
    for query in ["o", "os", "osl", "oslo"] {
        grid.set_filter(query);
        assert!(grid.visible_count() <= previous);
        previous = grid.visible_count();
    }
    assert_eq!(previous, 1);
    grid.clear_filter();
    assert_eq!(grid.visible_count(), 3);
}

#[test]
fn test_filter_is_case_insensitive_and_survives_sort() {
    let mut grid = grid(&["Name"], &[&["ALPHA"], &["beta"], &["Alphabet"]]);
    grid.set_filter("alpha");
    grid.click_header(0);
    assert_eq!(grid.visible_count(), 2);
    assert_eq!(grid.filter(), "alpha");
}

#[test]
fn test_export_ignores_filter_but_follows_order() -> Result<()> {
    let mut grid = grid(&["Name", "Age"], &[&["Bob", "30"], &["Ann", "25"]]);
    grid.set_filter("bob");
    grid.click_header(0);
    grid.move_column(1, 0);

    let file = grid.export(ExportFormat::Csv)?;
    assert_eq!(file.content, "\"Age\",\"Name\"\n\"25\",\"Ann\"\n\"30\",\"Bob\"");
    Ok(())
}

#[test]
fn test_csv_and_json_keep_commas_and_quotes() -> Result<()> {
    let grid = Grid::new(
        vec!["Name".into(), "Note".into()],
        vec![text_row(["Bob, Jr.", "says \"hi\""])],
        GridOptions::default().exportable(ExportContext::new("contact", "Main View")),
    );

    let csv = grid.export(ExportFormat::Csv)?;
    assert_eq!(csv.file_name, "contact_main_view.csv");
    assert_eq!(csv.content, "\"Name\",\"Note\"\n\"Bob, Jr.\",\"says \"\"hi\"\"\"");

    let json = grid.export(ExportFormat::Json)?;
    let value: Value = serde_json::from_str(&json.content)?;
    assert_eq!(value["entity"], "contact");
    assert_eq!(value["tab"], "Main View");
    assert_eq!(value["headers"], json!(["Name", "Note"]));
    assert_eq!(value["rows"], json!([["Bob, Jr.", "says \"hi\""]]));
    Ok(())
}

#[test]
fn test_markdown_escapes_pipes() -> Result<()> {
    let grid = Grid::new(
        vec!["Expr".into()],
        vec![text_row(["a | b"]), text_row(["line\nbreak"])],
        GridOptions::default(),
    );
    let md = grid.export(ExportFormat::Markdown)?;
    assert!(md.content.contains("a \\| b"));
    assert!(md.content.contains("line break"));
    assert_eq!(md.mime, "text/markdown");
    Ok(())
}

#[test]
fn test_payload_cells_export_as_text() -> Result<()> {
    let grid = Grid::new(
        vec!["Flag".into(), "Nested".into(), "Missing".into()],
        vec![vec![
            CellValue::from(json!(true)),
            CellValue::from(json!({"k": 1})),
            CellValue::from(Value::Null),
        ]],
        GridOptions::default(),
    );
    let (_, rows) = grid.export_table();
    assert_eq!(rows, vec![vec!["true".to_string(), r#"{"k":1}"#.into(), String::new()]]);
    Ok(())
}
