//! CSV生成（共通ライブラリ）
//!
//! RFC 4180 形式: カンマ・引用符・改行を含むセルは二重引用符で囲む

use crate::report::{ReportRow, REPORT_HEADERS};

fn escape_cell(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

fn write_line<S: AsRef<str>>(out: &mut String, cells: &[S]) {
    let line = cells
        .iter()
        .map(|c| escape_cell(c.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&line);
    out.push_str("\r\n");
}

/// ヘッダー付きCSV文字列を生成
pub fn generate_csv(rows: &[ReportRow]) -> String {
    let mut out = String::new();
    write_line(&mut out, &REPORT_HEADERS);
    for row in rows {
        write_line(&mut out, &row.cells());
    }
    out
}
