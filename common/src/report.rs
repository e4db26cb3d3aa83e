//! レポート行とセッション別集計

use crate::types::AttendanceRecord;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// 出力列（CSV・Excel共通）
pub const REPORT_HEADERS: [&str; 7] = ["date", "day", "session", "time", "fellow", "status", "email"];

/// 表形式の1行（セッション番号は1始まり、未照合のメールは空文字）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub date: String,
    pub day: String,
    pub session: usize,
    pub time: String,
    pub fellow: String,
    pub status: String,
    pub email: String,
}

impl From<&AttendanceRecord> for ReportRow {
    fn from(record: &AttendanceRecord) -> Self {
        Self {
            date: record.date.to_string(),
            day: record.day_name.clone(),
            session: record.session_number(),
            time: record.time_slot.clone(),
            fellow: record.fellow.clone(),
            status: record.status.to_string(),
            email: record.matched_email.clone().unwrap_or_default(),
        }
    }
}

impl ReportRow {
    /// REPORT_HEADERS と同じ順序のセル
    pub fn cells(&self) -> [String; 7] {
        [
            self.date.clone(),
            self.day.clone(),
            self.session.to_string(),
            self.time.clone(),
            self.fellow.clone(),
            self.status.clone(),
            self.email.clone(),
        ]
    }
}

pub fn report_rows(records: &[AttendanceRecord]) -> Vec<ReportRow> {
    records.iter().map(ReportRow::from).collect()
}

/// セッション別の集計
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub date: NaiveDate,
    pub day_name: String,
    pub session_index: usize,
    pub time_slot: String,
    pub present: usize,
    pub absent_names: Vec<String>,
}

impl SessionSummary {
    pub fn total(&self) -> usize {
        self.present + self.absent_names.len()
    }
}

/// 日付・セッション順に集計
pub fn summarize(records: &[AttendanceRecord]) -> Vec<SessionSummary> {
    let mut by_session: BTreeMap<(NaiveDate, usize), SessionSummary> = BTreeMap::new();

    for record in records {
        let summary = by_session
            .entry((record.date, record.session_index))
            .or_insert_with(|| SessionSummary {
                date: record.date,
                day_name: record.day_name.clone(),
                session_index: record.session_index,
                time_slot: record.time_slot.clone(),
                present: 0,
                absent_names: Vec::new(),
            });
        if record.status.is_present() {
            summary.present += 1;
        } else {
            summary.absent_names.push(record.fellow.clone());
        }
    }

    by_session.into_values().collect()
}
