//! Fellow Attendance Common Library
//!
//! CLIと他のフロントエンドで共有される型と純粋ロジック:
//! スケジュール展開、送信者照合、LLM応答パース、レポート生成

pub mod types;
pub mod roster;
pub mod schedule;
pub mod matching;
pub mod error;
pub mod parser;
pub mod prompts;
pub mod report;
pub mod export;

pub use types::{
    AttendanceRecord, AttendanceStatus, ExcuseAnalysis, ExpectedEntry, NoPhotoMessage,
    ObservedSender, Suggestion,
};
pub use roster::Roster;
pub use schedule::{DateRange, Session, WeekType, WeeklySchedule, SESSION_DAYS};
pub use matching::{normalize_name, reconcile, sender_matches_fellow, which_fellow};
pub use error::{Error, Result};
pub use parser::{extract_json, parse_excuse_response};
pub use prompts::build_excuse_prompt;
pub use report::{report_rows, summarize, ReportRow, SessionSummary};
