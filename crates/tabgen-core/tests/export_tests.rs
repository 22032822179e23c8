use serde_json::json;
use tabgen_core::{render_preview, to_csv, write_csv, Column, Row};
use tempfile::TempDir;

fn columns() -> Vec<Column> {
    vec![Column::new("Name"), Column::new("Motto"), Column::new("Founded")]
}

fn row(value: serde_json::Value) -> Row {
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_header_and_column_order() {
    let rows = vec![row(json!({"Founded": 1998, "Name": "Google", "Motto": "Don't be evil"}))];
    let csv = to_csv(&columns(), &rows).unwrap();
    assert_eq!(csv, "Name,Motto,Founded\nGoogle,Don't be evil,1998\n");
}

#[test]
fn test_quoting() {
    let rows = vec![row(json!({
        "Name": "Acme, Inc.",
        "Motto": "We say \"hi\"",
        "Founded": "line one\nline two"
    }))];
    let csv = to_csv(&columns(), &rows).unwrap();
    assert_eq!(
        csv,
        "Name,Motto,Founded\n\"Acme, Inc.\",\"We say \"\"hi\"\"\",\"line one\nline two\"\n"
    );
}

#[test]
fn test_missing_and_null_are_empty() {
    let rows = vec![row(json!({"Name": "Solo", "Motto": null}))];
    let csv = to_csv(&columns(), &rows).unwrap();
    assert_eq!(csv, "Name,Motto,Founded\nSolo,,\n");
}

#[test]
fn test_extra_keys_are_ignored() {
    let rows = vec![row(json!({"Name": "X", "Unrequested": "y"}))];
    let csv = to_csv(&columns(), &rows).unwrap();
    assert!(!csv.contains("Unrequested"));
}

#[test]
fn test_write_csv_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("out.csv");

    let rows = vec![row(json!({"Name": "A", "Motto": "b", "Founded": true}))];
    write_csv(&path, &columns(), &rows).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, "Name,Motto,Founded\nA,b,true\n");
}

#[test]
fn test_write_csv_bad_path() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing-dir").join("out.csv");
    assert!(write_csv(&path, &columns(), &[]).is_err());
}

#[test]
fn test_preview_placeholder() {
    let rows = vec![row(json!({"Name": "Solo"}))];
    let preview = render_preview(&columns(), &rows, 10);

    let solo_line = preview.lines().find(|l| l.contains("Solo")).unwrap();
    let cells: Vec<&str> = solo_line
        .split('│')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();
    assert_eq!(cells, vec!["Solo", "-", "-"]);
    assert!(preview.lines().any(|l| l.contains("Name") && l.contains("Founded")));
}

/// Display width, counting CJK ideographs as two cells.
fn display_width(line: &str) -> usize {
    line.chars()
        .map(|c| if ('\u{2E80}'..='\u{9FFF}').contains(&c) { 2 } else { 1 })
        .sum()
}

#[test]
fn test_preview_aligns_wide_characters() {
    let columns = vec![Column::new("City"), Column::new("Country")];
    let rows = vec![
        row(json!({"City": "東京都", "Country": "Japan"})),
        row(json!({"City": "Oslo", "Country": "Norway"})),
    ];
    let preview = render_preview(&columns, &rows, 10);

    let widths: Vec<usize> = preview.lines().map(display_width).collect();
    assert!(widths.len() > 2);
    assert!(widths.iter().all(|w| *w == widths[0]));
}
