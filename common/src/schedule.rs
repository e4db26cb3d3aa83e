//! 週スケジュールの展開
//!
//! schedule.yaml は2種類の週（blue / gold）ごとに、曜日 → セッションのリスト
//! を定義する。指定期間の各日付について、その日に出席が期待される
//! セッションを順序どおりに列挙する。

use crate::error::{Error, Result};
use crate::types::ExpectedEntry;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const SCHEDULE_FILE_NAME: &str = "schedule.yaml";

/// セッションが行われる曜日
pub const SESSION_DAYS: [Weekday; 3] = [Weekday::Sun, Weekday::Tue, Weekday::Thu];

/// 週タイプ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WeekType {
    Blue,
    Gold,
}

impl WeekType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeekType::Blue => "blue",
            WeekType::Gold => "gold",
        }
    }
}

impl FromStr for WeekType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "blue" => Ok(WeekType::Blue),
            "gold" => Ok(WeekType::Gold),
            _ => Err(Error::Config(format!(
                "Unknown week type: {}. Use 'blue' or 'gold'.",
                s
            ))),
        }
    }
}

impl fmt::Display for WeekType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 1コマのセッション
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Session {
    /// 時間帯ラベル（検証しない）
    pub time: String,
    /// 出席が期待されるフェロー名（並び順を保持）
    pub fellows: Vec<String>,
}

type RawWeek = HashMap<String, Option<Vec<Session>>>;

/// 週タイプ → 曜日 → セッション
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklySchedule {
    weeks: HashMap<WeekType, HashMap<Weekday, Vec<Session>>>,
}

impl WeeklySchedule {
    /// 設定ディレクトリの schedule.yaml を読み込み
    pub fn load(config_dir: &Path) -> Result<Self> {
        let path = config_dir.join(SCHEDULE_FILE_NAME);
        if !path.exists() {
            return Err(Error::Config(format!(
                "Schedule not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(&path)?;
        Self::from_yaml(&content)
    }

    /// YAML文字列から読み込み
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let raw: Option<HashMap<String, Option<RawWeek>>> = serde_yaml::from_str(yaml)
            .map_err(|e| Error::Config(format!("invalid {}: {}", SCHEDULE_FILE_NAME, e)))?;

        // 正規化後に重複するキー（"tuesday" と "Tue" など）は設定エラー
        let mut weeks = HashMap::new();
        for (week_name, days) in raw.unwrap_or_default() {
            let week_type: WeekType = week_name.parse()?;
            let mut by_day = HashMap::new();
            for (day_name, sessions) in days.unwrap_or_default() {
                let weekday = parse_weekday(&day_name)?;
                if by_day.contains_key(&weekday) {
                    return Err(Error::Config(format!(
                        "duplicate weekday '{}' in week '{}'",
                        day_name, week_name
                    )));
                }
                by_day.insert(weekday, sessions.unwrap_or_default());
            }
            if weeks.contains_key(&week_type) {
                return Err(Error::Config(format!("duplicate week '{}'", week_name)));
            }
            weeks.insert(week_type, by_day);
        }

        Ok(Self { weeks })
    }

    /// プログラムから追加（テスト・組み込み用途）
    pub fn insert(&mut self, week: WeekType, day: Weekday, sessions: Vec<Session>) {
        self.weeks.entry(week).or_default().insert(day, sessions);
    }

    /// 指定曜日のセッション
    pub fn sessions(&self, week: WeekType, day: Weekday) -> &[Session] {
        self.weeks
            .get(&week)
            .and_then(|days| days.get(&day))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 期間内に出席が期待されるセッションを列挙
    ///
    /// `start <= end` を前提とする（逆順は [`DateRange::new`] で正規化）。
    /// 除外日・セッション曜日以外・その週タイプに設定のない曜日は飛ばす。
    pub fn expand(
        &self,
        week_type: &str,
        start: NaiveDate,
        end: NaiveDate,
        excluded: &BTreeSet<NaiveDate>,
    ) -> Result<Vec<ExpectedEntry>> {
        let week_type: WeekType = week_type.parse()?;
        let week = self.weeks.get(&week_type).ok_or_else(|| {
            Error::Config(format!("Week type '{}' is not configured in the schedule", week_type))
        })?;

        let mut result = Vec::new();
        for date in start.iter_days().take_while(|d| *d <= end) {
            if excluded.contains(&date) {
                continue;
            }
            let weekday = date.weekday();
            if !SESSION_DAYS.contains(&weekday) {
                continue;
            }
            let Some(sessions) = week.get(&weekday) else {
                continue;
            };
            for (idx, session) in sessions.iter().enumerate() {
                result.push(ExpectedEntry {
                    date,
                    day_name: weekday_name(weekday).to_string(),
                    session_index: idx,
                    time_slot: session.time.clone(),
                    fellows: session.fellows.clone(),
                });
            }
        }

        Ok(result)
    }
}

/// 小文字の曜日名
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

fn parse_weekday(name: &str) -> Result<Weekday> {
    name.trim()
        .parse::<Weekday>()
        .map_err(|_| Error::Config(format!("Unknown weekday in schedule: {}", name)))
}

/// 両端を含む日付範囲
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// 逆順なら入れ替える
    pub fn new(a: NaiveDate, b: NaiveDate) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// 日曜〜土曜の週
    pub fn week_containing(date: NaiveDate) -> Self {
        let days_back = date.weekday().num_days_from_sunday() as i64;
        let start = date - Duration::days(days_back);
        Self {
            start,
            end: start + Duration::days(6),
        }
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}
