//! 送信者とフェローの照合
//!
//! 写真付きメールの差出人（メールアドレス・表示名）を、その日に出席が
//! 期待されるフェローと照合する。
//!
//! 照合規則（すべて小文字化・空白正規化した値で比較）:
//! 1. エイリアスがメールアドレスまたは表示名と完全一致
//! 2. メールアドレスがエイリアスを部分文字列として含む
//! 3. 表示名がエイリアスを部分文字列として含む
//! 4. フェロー名と表示名の一方が他方を含む
//! 5. フェロー名の全単語が表示名（カンマ区切りも可）の単語集合に含まれる
//!    （"Liu, Jerry" と "Jerry Liu"）
//!
//! 1人の送信者が複数のフェローに一致する場合は、セッションの並び順で
//! 先に来るフェローが採用される。順序依存の挙動であり、エラーではない。

use crate::roster::Roster;
use crate::types::{AttendanceRecord, AttendanceStatus, ExpectedEntry, ObservedSender};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet};

/// 小文字化して連続空白を1つにまとめる
pub fn normalize_name(s: &str) -> String {
    s.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn word_set(s: &str) -> HashSet<&str> {
    s.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|w| !w.is_empty())
        .collect()
}

/// 送信者 (email, display_name) がこのフェローとみなせるか
pub fn sender_matches_fellow(
    email: &str,
    display_name: &str,
    fellow_name: &str,
    fellow_aliases: &[String],
) -> bool {
    let email = email.trim().to_lowercase();
    let dn = normalize_name(display_name);
    let fellow = normalize_name(fellow_name);

    for alias in fellow_aliases {
        let alias = normalize_name(alias);
        if alias.is_empty() {
            continue;
        }
        if alias == email || alias == dn {
            return true;
        }
        if !email.is_empty() && email.contains(&alias) {
            return true;
        }
        if !dn.is_empty() && dn.contains(&alias) {
            return true;
        }
    }

    // エイリアス未登録でも名前だけで照合する
    if fellow.is_empty() || dn.is_empty() {
        return false;
    }
    if dn.contains(&fellow) || fellow.contains(&dn) {
        return true;
    }

    let dn_words = word_set(&dn);
    word_set(&fellow).iter().all(|w| dn_words.contains(w))
}

/// 候補フェローのうち、この送信者に一致する最初のフェロー
pub fn which_fellow<'a>(
    sender: &ObservedSender,
    candidates: &'a [String],
    roster: &Roster,
) -> Option<&'a str> {
    candidates
        .iter()
        .find(|fellow| {
            sender_matches_fellow(
                &sender.email,
                &sender.display_name,
                fellow,
                roster.aliases(fellow),
            )
        })
        .map(String::as_str)
}

/// 期待セッションと観測された送信者を突き合わせて出欠を決定
///
/// 期待セッションの各フェローについて必ず1件のレコードを返す。
/// 同じフェローに複数の送信者が一致した場合は到着順で最初の送信者を採用する。
pub fn reconcile(
    expected: &[ExpectedEntry],
    observed: &BTreeMap<NaiveDate, Vec<ObservedSender>>,
    roster: &Roster,
) -> Vec<AttendanceRecord> {
    let mut report = Vec::with_capacity(expected.iter().map(|e| e.fellows.len()).sum());

    for entry in expected {
        let senders = observed.get(&entry.date).map(Vec::as_slice).unwrap_or(&[]);

        let mut matched: HashMap<&str, &str> = HashMap::new();
        for sender in senders {
            if let Some(fellow) = which_fellow(sender, &entry.fellows, roster) {
                matched.entry(fellow).or_insert(sender.email.as_str());
            }
        }

        for fellow in &entry.fellows {
            let matched_email = matched.get(fellow.as_str()).map(|e| e.to_string());
            let status = if matched_email.is_some() {
                AttendanceStatus::Present
            } else {
                AttendanceStatus::Absent
            };
            report.push(AttendanceRecord {
                date: entry.date,
                day_name: entry.day_name.clone(),
                session_index: entry.session_index,
                time_slot: entry.time_slot.clone(),
                fellow: fellow.clone(),
                status,
                matched_email,
            });
        }
    }

    report
}
