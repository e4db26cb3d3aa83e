use clap::{Parser, Subcommand};
use crate::ai_provider::AiProvider;
use chrono::NaiveDate;
use fellow_attendance_common::DateRange;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "fellow-attendance")]
#[command(about = "Check fellow photo attendance against the weekly schedule", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 欠席連絡の解析に使うAIプロバイダ (gemini/claude)
    #[arg(long, default_value = "gemini", global = true)]
    pub ai_provider: AiProvider,

    /// schedule.yaml / fellows.yaml / credentials.json のあるディレクトリ
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,
}

/// 対象期間の指定（check / expected 共通）
#[derive(clap::Args, Clone, Debug)]
pub struct RangeArgs {
    /// 週の種類 (blue/gold)
    #[arg(short, long)]
    pub week: String,

    /// 休みの日（複数指定可、YYYY-MM-DD）
    #[arg(long, value_parser = parse_date, num_args = 1..)]
    pub off: Vec<NaiveDate>,

    /// 開始日（省略時は今週の日曜）
    #[arg(long, value_parser = parse_date)]
    pub start: Option<NaiveDate>,

    /// 終了日（省略時は今週の土曜）
    #[arg(long, value_parser = parse_date)]
    pub end: Option<NaiveDate>,
}

impl RangeArgs {
    /// 省略された端は基準日を含む日曜〜土曜の週で補う
    ///
    /// 基準日は指定された方の端、どちらも無ければ `today`。
    pub fn date_range(&self, today: NaiveDate) -> DateRange {
        let anchor = self.start.or(self.end).unwrap_or(today);
        let week = DateRange::week_containing(anchor);
        DateRange::new(self.start.unwrap_or(week.start), self.end.unwrap_or(week.end))
    }

    pub fn days_off(&self) -> BTreeSet<NaiveDate> {
        self.off.iter().copied().collect()
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// 受信箱を確認して出欠を判定
    Check {
        #[command(flatten)]
        range: RangeArgs,

        /// 出力ファイル（.csv / .xlsx）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 出力形式 (csv/excel)。省略時は拡張子から判定
        #[arg(short, long)]
        format: Option<ExportFormat>,

        /// 写真なしメールをAIで解析
        #[arg(long)]
        analyze_excuses: bool,

        /// 解析キャッシュを使用
        #[arg(long)]
        use_cache: bool,
    },

    /// 期待されるセッションを表示（メールは見ない）
    Expected {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// 出欠写真の受信箱を設定
        #[arg(long)]
        set_inbox: Option<String>,

        /// 設定ディレクトリを保存
        #[arg(long)]
        set_config_dir: Option<PathBuf>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },

    /// キャッシュ管理
    Cache {
        /// キャッシュを削除
        #[arg(long)]
        clear: bool,

        /// キャッシュ情報を表示
        #[arg(long)]
        info: bool,
    },
}

pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date: {}. Use YYYY-MM-DD", s))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Excel,
}

impl ExportFormat {
    /// 拡張子から推定（.xlsx / .xls 以外はCSV）
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("xlsx") | Some("xls") => ExportFormat::Excel,
            _ => ExportFormat::Csv,
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            _ => Err(format!("Unknown format: {}. Use csv or excel", s)),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Excel => write!(f, "excel"),
        }
    }
}
