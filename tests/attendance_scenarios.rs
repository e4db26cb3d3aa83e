//! 出欠判定の通しテスト
//!
//! 設定ファイル → スケジュール展開 → 送信者取得（固定応答）→ 照合 → 出力・欠席連絡解析

use chrono::NaiveDate;
use fellow_attendance::analyzer::{analyze_excuses, ExcuseCache, ExcuseClassifier};
use fellow_attendance::cli::ExportFormat;
use fellow_attendance::error::{AttendanceError, Result};
use fellow_attendance::export::export_records;
use fellow_attendance::mail::{collect_senders, MailTransport};
use fellow_attendance_common::{
    reconcile, AttendanceStatus, ExcuseAnalysis, NoPhotoMessage, ObservedSender, Roster,
    Suggestion, WeeklySchedule,
};
use indicatif::ProgressBar;
use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tempfile::tempdir;

const SCHEDULE_YAML: &str = r#"
blue:
  tuesday:
    - time: "3pm"
      fellows: ["Ann Lee", "Bo Kim"]
gold:
  sunday:
    - time: "7pm"
      fellows: ["Ann Lee"]
"#;

const FELLOWS_YAML: &str = r#"
"Ann Lee": ["alee@x.com"]
"Bo Kim": []
"#;

fn tuesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, 18).unwrap()
}

fn write_config(dir: &Path) {
    std::fs::write(dir.join("schedule.yaml"), SCHEDULE_YAML).unwrap();
    std::fs::write(dir.join("fellows.yaml"), FELLOWS_YAML).unwrap();
}

/// 日付ごとの固定応答を返す受信箱
#[derive(Default)]
struct FakeInbox {
    photo: HashMap<NaiveDate, Vec<ObservedSender>>,
    no_photo: HashMap<NaiveDate, Vec<NoPhotoMessage>>,
    bodies: HashMap<String, String>,
}

impl MailTransport for FakeInbox {
    async fn fetch_senders_with_photo(&self, date: NaiveDate) -> Result<Vec<ObservedSender>> {
        Ok(self.photo.get(&date).cloned().unwrap_or_default())
    }

    async fn fetch_senders_without_photo(&self, date: NaiveDate) -> Result<Vec<ObservedSender>> {
        Ok(self
            .no_photo
            .get(&date)
            .map(|msgs| msgs.iter().map(|m| m.sender.clone()).collect())
            .unwrap_or_default())
    }

    async fn fetch_no_photo_messages(&self, date: NaiveDate) -> Result<Vec<NoPhotoMessage>> {
        Ok(self.no_photo.get(&date).cloned().unwrap_or_default())
    }

    async fn fetch_message_body(&self, message_id: &str) -> Result<String> {
        self.bodies
            .get(message_id)
            .cloned()
            .ok_or_else(|| AttendanceError::Mail(format!("no message {}", message_id)))
    }
}

/// 本文に "sick" があれば承認する分類器
#[derive(Default)]
struct KeywordClassifier {
    calls: Cell<usize>,
}

impl ExcuseClassifier for KeywordClassifier {
    async fn classify(
        &self,
        email_body: &str,
        _sender_email: &str,
        _sender_name: &str,
    ) -> Result<ExcuseAnalysis> {
        self.calls.set(self.calls.get() + 1);
        if email_body.contains("boom") {
            return Err(AttendanceError::ApiCall("service unavailable".into()));
        }
        Ok(ExcuseAnalysis {
            reason: email_body.to_string(),
            suggestion: if email_body.contains("sick") {
                Suggestion::Approve
            } else {
                Suggestion::Reject
            },
            explanation: String::new(),
        })
    }
}

async fn run_check(config_dir: &Path, inbox: &FakeInbox) -> Vec<fellow_attendance_common::AttendanceRecord> {
    let schedule = WeeklySchedule::load(config_dir).unwrap();
    let roster = Roster::load(config_dir).unwrap();
    let expected = schedule
        .expand("blue", tuesday(), tuesday(), &BTreeSet::new())
        .unwrap();
    let dates: Vec<NaiveDate> = expected.iter().map(|e| e.date).collect();

    let snapshot = collect_senders(inbox, &dates, &ProgressBar::hidden()).await.unwrap();
    reconcile(&expected, &snapshot.photo_senders, &roster)
}

#[tokio::test]
async fn test_alias_email_marks_present() {
    let dir = tempdir().unwrap();
    write_config(dir.path());

    let mut inbox = FakeInbox::default();
    inbox.photo.insert(tuesday(), vec![ObservedSender::new("alee@x.com", "")]);

    let records = run_check(dir.path(), &inbox).await;

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].fellow, "Ann Lee");
    assert_eq!(records[0].status, AttendanceStatus::Present);
    assert_eq!(records[0].matched_email.as_deref(), Some("alee@x.com"));
    assert_eq!(records[1].fellow, "Bo Kim");
    assert_eq!(records[1].status, AttendanceStatus::Absent);
    assert_eq!(records[1].matched_email, None);
}

#[tokio::test]
async fn test_display_name_fallback_marks_present() {
    let dir = tempdir().unwrap();
    write_config(dir.path());

    let mut inbox = FakeInbox::default();
    inbox
        .photo
        .insert(tuesday(), vec![ObservedSender::new("unknown@x.com", "Bo Kim")]);

    let records = run_check(dir.path(), &inbox).await;

    assert_eq!(records[0].status, AttendanceStatus::Absent);
    assert_eq!(records[1].status, AttendanceStatus::Present);
    assert_eq!(records[1].matched_email.as_deref(), Some("unknown@x.com"));
}

#[tokio::test]
async fn test_reconcile_is_idempotent() {
    let dir = tempdir().unwrap();
    write_config(dir.path());

    let mut inbox = FakeInbox::default();
    inbox.photo.insert(
        tuesday(),
        vec![
            ObservedSender::new("alee@x.com", "Ann Lee"),
            ObservedSender::new("bo.kim@x.com", "Kim, Bo"),
        ],
    );

    let first = run_check(dir.path(), &inbox).await;
    let second = run_check(dir.path(), &inbox).await;
    assert_eq!(first, second);
    assert!(first.iter().all(|r| r.status == AttendanceStatus::Present));
}

#[test]
fn test_all_days_off_means_nothing_to_check() {
    let dir = tempdir().unwrap();
    write_config(dir.path());

    let schedule = WeeklySchedule::load(dir.path()).unwrap();
    let off: BTreeSet<NaiveDate> = [tuesday()].into_iter().collect();
    let expected = schedule.expand("BLUE", tuesday(), tuesday(), &off).unwrap();
    assert!(expected.is_empty());
}

#[test]
fn test_missing_schedule_is_config_error() {
    let dir = tempdir().unwrap();
    let err: AttendanceError = WeeklySchedule::load(dir.path()).unwrap_err().into();
    assert!(err.to_string().contains("Schedule not found"));
}

#[tokio::test]
async fn test_export_csv_and_excel() {
    let dir = tempdir().unwrap();
    write_config(dir.path());

    let mut inbox = FakeInbox::default();
    inbox.photo.insert(tuesday(), vec![ObservedSender::new("alee@x.com", "")]);
    let records = run_check(dir.path(), &inbox).await;

    let csv_path = export_records(&records, &dir.path().join("out/report.csv"), None, "blue").unwrap();
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "date,day,session,time,fellow,status,email");
    assert_eq!(lines[1], "2025-02-18,tuesday,1,3pm,Ann Lee,present,alee@x.com");
    assert_eq!(lines[2], "2025-02-18,tuesday,1,3pm,Bo Kim,absent,");

    let xlsx_path = export_records(
        &records,
        &dir.path().join("report"),
        Some(ExportFormat::Excel),
        "blue 2025-02-16",
    )
    .unwrap();
    assert_eq!(xlsx_path.extension().unwrap(), "xlsx");
    let bytes = std::fs::read(&xlsx_path).unwrap();
    assert_eq!(&bytes[..2], b"PK");

    // --format excel と .csv の出力先が食い違う場合は .xlsx に書く
    let mismatched = export_records(
        &records,
        &dir.path().join("mismatch.csv"),
        Some(ExportFormat::Excel),
        "blue",
    )
    .unwrap();
    assert_eq!(mismatched, dir.path().join("mismatch.xlsx"));
    assert!(!dir.path().join("mismatch.csv").exists());
}

#[tokio::test]
async fn test_excuse_analysis_uses_cache() {
    let dir = tempdir().unwrap();

    let mut inbox = FakeInbox::default();
    inbox.no_photo.insert(
        tuesday(),
        vec![
            NoPhotoMessage {
                message_id: "m1".into(),
                sender: ObservedSender::new("bo@x.com", "Bo Kim"),
            },
            NoPhotoMessage {
                message_id: "m2".into(),
                sender: ObservedSender::new("ann@x.com", "Ann Lee"),
            },
        ],
    );
    inbox.bodies.insert("m1".into(), "I am sick today".into());
    inbox.bodies.insert("m2".into(), "boom".into());

    let classifier = KeywordClassifier::default();
    let mut cache = ExcuseCache::load(dir.path());

    let reports = analyze_excuses(&inbox, &classifier, &[tuesday()], Some(&mut cache))
        .await
        .unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].analysis.suggestion, Suggestion::Approve);
    assert_eq!(reports[1].analysis.reason, "(error)");
    assert_eq!(classifier.calls.get(), 2);
    // 失敗した解析はキャッシュしない
    assert_eq!(cache.len(), 1);
    cache.save(dir.path()).unwrap();

    let mut reloaded = ExcuseCache::load(dir.path());
    let again = analyze_excuses(&inbox, &classifier, &[tuesday()], Some(&mut reloaded))
        .await
        .unwrap();
    assert_eq!(again[0].analysis, reports[0].analysis);
    assert_eq!(classifier.calls.get(), 3);
}

#[tokio::test]
async fn test_excuse_analysis_without_classifier() {
    let mut inbox = FakeInbox::default();
    inbox.no_photo.insert(
        tuesday(),
        vec![NoPhotoMessage {
            message_id: "m1".into(),
            sender: ObservedSender::new("bo@x.com", ""),
        }],
    );

    let reports = analyze_excuses(
        &inbox,
        &fellow_attendance::analyzer::Classifier::Unavailable,
        &[tuesday()],
        None,
    )
    .await
    .unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].analysis, ExcuseAnalysis::cannot_analyze());
}
