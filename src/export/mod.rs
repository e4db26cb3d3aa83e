//! 出欠レポートのファイル出力
//!
//! 生成はcommonの `csv_core` / `excel_core` に任せ、ここではファイルへの書き込みだけ行う

use crate::cli::ExportFormat;
use crate::error::{AttendanceError, Result};
use fellow_attendance_common::export::{csv_core, excel_core};
use fellow_attendance_common::{report_rows, AttendanceRecord};
use std::path::{Path, PathBuf};

/// 出力形式に合わせて拡張子を補う（形式と食い違う拡張子は置き換える）
fn output_path_for_format(output: &Path, format: ExportFormat) -> PathBuf {
    if output.extension().is_some() && ExportFormat::from_path(output) == format {
        return output.to_path_buf();
    }
    let extension = match format {
        ExportFormat::Csv => "csv",
        ExportFormat::Excel => "xlsx",
    };
    output.with_extension(extension)
}

/// レポートを書き出し、実際に書いたパスを返す
///
/// `format` が None なら拡張子から判定する。
pub fn export_records(
    records: &[AttendanceRecord],
    output: &Path,
    format: Option<ExportFormat>,
    sheet_name: &str,
) -> Result<PathBuf> {
    let format = format.unwrap_or_else(|| ExportFormat::from_path(output));
    let output_path = output_path_for_format(output, format);
    let rows = report_rows(records);

    let bytes = match format {
        ExportFormat::Csv => csv_core::generate_csv(&rows).into_bytes(),
        ExportFormat::Excel => excel_core::generate_excel_buffer(&rows, sheet_name)
            .map_err(AttendanceError::Export)?,
    };

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&output_path, bytes).map_err(|e| {
        AttendanceError::Export(format!("{}: {}", output_path.display(), e))
    })?;
    log::info!("wrote {} rows to {}", rows.len(), output_path.display());

    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_for_format() {
        assert_eq!(
            output_path_for_format(Path::new("out/report"), ExportFormat::Excel),
            PathBuf::from("out/report.xlsx")
        );
        assert_eq!(
            output_path_for_format(Path::new("report.xlsx"), ExportFormat::Excel),
            PathBuf::from("report.xlsx")
        );
        // 形式と拡張子が食い違う場合は形式に合わせる
        assert_eq!(
            output_path_for_format(Path::new("out.csv"), ExportFormat::Excel),
            PathBuf::from("out.xlsx")
        );
        assert_eq!(
            output_path_for_format(Path::new("out.xlsx"), ExportFormat::Csv),
            PathBuf::from("out.csv")
        );
        assert_eq!(
            output_path_for_format(Path::new("out.txt"), ExportFormat::Csv),
            PathBuf::from("out.txt")
        );
    }
}
