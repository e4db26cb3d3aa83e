//! コンソール出力
//!
//! 表示文字列を組み立てるだけで、出力は呼び出し側の `println!` に任せる

use crate::analyzer::ExcuseReport;
use chrono::NaiveDate;
use fellow_attendance_common::{summarize, AttendanceRecord, DateRange, ExpectedEntry, ObservedSender};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

/// "Week: blue | Range: ..." と休日の行
pub fn render_header(week: &str, range: &DateRange, days_off: &BTreeSet<NaiveDate>) -> String {
    let mut out = format!("Week: {} | Range: {}\n", week, range);
    if !days_off.is_empty() {
        let days: Vec<String> = days_off.iter().map(|d| d.to_string()).collect();
        let _ = writeln!(out, "Days off: {}", days.join(", "));
    }
    out
}

/// セッションごとの出欠一覧（✓/✗）
pub fn render_records(records: &[AttendanceRecord]) -> String {
    let mut out = String::new();
    let mut current: Option<(NaiveDate, usize)> = None;

    for record in records {
        let key = (record.date, record.session_index);
        if current != Some(key) {
            current = Some(key);
            let _ = writeln!(
                out,
                "{} {} Session {} ({})",
                record.date,
                record.day_name,
                record.session_number(),
                record.time_slot
            );
        }
        let symbol = if record.status.is_present() { "✓" } else { "✗" };
        let email = record
            .matched_email
            .as_deref()
            .map(|e| format!(" ({})", e))
            .unwrap_or_default();
        let _ = writeln!(out, "  {} {}: {}{}", symbol, record.fellow, record.status, email);
    }

    out
}

pub fn render_summary(records: &[AttendanceRecord]) -> String {
    let mut out = String::from("Summary:\n");
    for s in summarize(records) {
        let _ = write!(
            out,
            "  {} {} Session {}: {}/{} present",
            s.date,
            s.day_name,
            s.session_index + 1,
            s.present,
            s.total()
        );
        if !s.absent_names.is_empty() {
            let _ = write!(out, " (absent: {})", s.absent_names.join(", "));
        }
        out.push('\n');
    }
    out
}

/// 写真なしメールの送信者一覧（いなければ空文字）
pub fn render_excuse_senders(no_photo: &BTreeMap<NaiveDate, Vec<ObservedSender>>) -> String {
    if no_photo.values().all(|s| s.is_empty()) {
        return String::new();
    }

    let mut out = String::from("Possible excuse emails (no image attached):\n");
    for (date, senders) in no_photo {
        for sender in senders {
            let _ = writeln!(out, "  {}: {}", date, sender.label());
        }
    }
    out
}

pub fn render_excuse_analyses(reports: &[ExcuseReport]) -> String {
    if reports.is_empty() {
        return String::new();
    }

    let mut out = String::from("Excuse analysis:\n");
    for report in reports {
        let _ = writeln!(out, "  {}: {}", report.date, report.message.sender.label());
        let _ = writeln!(out, "    Reason: {}", report.analysis.reason);
        let _ = writeln!(
            out,
            "    Suggestion: {}",
            report.analysis.suggestion.as_str().to_uppercase()
        );
        if !report.analysis.explanation.is_empty() {
            let _ = writeln!(out, "    Why: {}", report.analysis.explanation);
        }
    }
    out
}

/// `expected` コマンドの一覧
pub fn render_expected(entries: &[ExpectedEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let fellows = if entry.fellows.is_empty() {
            "(none)".to_string()
        } else {
            entry.fellows.join(", ")
        };
        let _ = writeln!(
            out,
            "{} {} Session {} ({}): {}",
            entry.date,
            entry.day_name,
            entry.session_index + 1,
            entry.time_slot,
            fellows
        );
    }
    out
}
