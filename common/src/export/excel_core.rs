//! Excel生成（共通ライブラリ）
//!
//! 出欠レポートを1シートのxlsxとしてバッファに生成

use crate::report::{ReportRow, REPORT_HEADERS};
use rust_xlsxwriter::*;

/// Excelをバッファに生成
///
/// # Arguments
/// * `rows` - レポート行
/// * `sheet_name` - シート名（Excelの制約で31文字まで）
pub fn generate_excel_buffer(rows: &[ReportRow], sheet_name: &str) -> Result<Vec<u8>, String> {
    let mut workbook = Workbook::new();

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(0xAAAAAA));
    let present_format = Format::new().set_font_color(Color::RGB(0x2E7D32));
    let absent_format = Format::new().set_bold().set_font_color(Color::RGB(0xC62828));

    let name: String = sheet_name.chars().take(31).collect();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(&name)
        .map_err(|e| format!("シート名設定エラー: {}", e))?;

    for (col, header) in REPORT_HEADERS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(|e| format!("ヘッダー書き込みエラー: {}", e))?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        let status_format = if row.status == "present" {
            &present_format
        } else {
            &absent_format
        };
        write_row(worksheet, r, row, status_format)
            .map_err(|e| format!("行書き込みエラー: {}", e))?;
    }

    worksheet
        .set_freeze_panes(1, 0)
        .map_err(|e| format!("ウィンドウ枠固定エラー: {}", e))?;
    worksheet.autofit();

    workbook
        .save_to_buffer()
        .map_err(|e| format!("Excel保存エラー: {}", e))
}

fn write_row(
    ws: &mut Worksheet,
    r: u32,
    row: &ReportRow,
    status_format: &Format,
) -> Result<(), XlsxError> {
    ws.write_string(r, 0, &row.date)?;
    ws.write_string(r, 1, &row.day)?;
    ws.write_number(r, 2, row.session as f64)?;
    ws.write_string(r, 3, &row.time)?;
    ws.write_string(r, 4, &row.fellow)?;
    ws.write_string_with_format(r, 5, &row.status, status_format)?;
    ws.write_string(r, 6, &row.email)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_excel_buffer() {
        let rows = vec![ReportRow {
            date: "2025-02-18".into(),
            day: "tuesday".into(),
            session: 1,
            time: "3pm".into(),
            fellow: "Ann Lee".into(),
            status: "present".into(),
            email: "alee@x.com".into(),
        }];
        let buffer = generate_excel_buffer(&rows, "attendance").unwrap();
        // xlsx は zip コンテナ
        assert!(buffer.starts_with(b"PK"));
    }

    #[test]
    fn test_long_sheet_name_truncated() {
        let name = "a".repeat(60);
        assert!(generate_excel_buffer(&[], &name).is_ok());
    }
}
