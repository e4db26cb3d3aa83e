//! Fellow Attendance
//!
//! 共有受信箱に届いた出欠写真メールとスケジュールを突き合わせるCLIのライブラリ部分

pub mod ai_provider;
pub mod analyzer;
pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod export;
pub mod mail;
