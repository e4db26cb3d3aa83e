//! ロスター（フェロー名 → 既知のエイリアス）
//!
//! fellows.yaml の値は null / 文字列 / スカラーのリストを許容する。
//! 読み込み時に正規化し、不正な値はここで `Error::Config` にする。
//! 照合中にエラーが発生することはない。

use crate::error::{Error, Result};
use crate::matching::normalize_name;
use serde_yaml::Value;
use std::collections::HashMap;
use std::path::Path;

pub const ROSTER_FILE_NAME: &str = "fellows.yaml";

/// フェロー名 → エイリアス（メールアドレスや別表記）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    fellows: HashMap<String, Vec<String>>,
}

impl Roster {
    /// 設定ディレクトリの fellows.yaml を読み込み（ファイルがなければ空）
    pub fn load(config_dir: &Path) -> Result<Self> {
        let path = config_dir.join(ROSTER_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Self::from_yaml(&content)
    }

    /// YAML文字列から読み込み
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(yaml)
            .map_err(|e| Error::Config(format!("invalid {}: {}", ROSTER_FILE_NAME, e)))?;
        Self::from_value(value)
    }

    fn from_value(value: Value) -> Result<Self> {
        let mapping = match value {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(m) => m,
            other => {
                return Err(Error::Config(format!(
                    "{} must be a mapping of fellow name to aliases, got {}",
                    ROSTER_FILE_NAME,
                    value_kind(&other)
                )))
            }
        };

        let mut fellows = HashMap::with_capacity(mapping.len());
        for (key, vals) in mapping {
            let name = match key {
                Value::String(s) => s,
                other => {
                    return Err(Error::Config(format!(
                        "fellow names must be strings, got {}",
                        value_kind(&other)
                    )))
                }
            };

            let raw = match vals {
                Value::Null => Vec::new(),
                Value::Sequence(seq) => seq
                    .iter()
                    .map(|v| coerce_scalar(v, &name))
                    .collect::<Result<Vec<_>>>()?,
                scalar => vec![coerce_scalar(&scalar, &name)?],
            };

            // 空文字のエイリアスは全送信者に部分一致してしまうため除外
            let aliases = raw
                .iter()
                .map(|a| normalize_name(a))
                .filter(|a| !a.is_empty())
                .collect();
            fellows.insert(name, aliases);
        }

        Ok(Self { fellows })
    }

    /// フェローのエイリアス（未登録なら空）
    pub fn aliases(&self, fellow: &str) -> &[String] {
        self.fellows.get(fellow).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, fellow: &str) -> bool {
        self.fellows.contains_key(fellow)
    }

    pub fn len(&self) -> usize {
        self.fellows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fellows.is_empty()
    }

    /// プログラムから追加（テスト・組み込み用途）
    pub fn insert<I, S>(&mut self, fellow: impl Into<String>, aliases: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let aliases = aliases
            .into_iter()
            .map(|a| normalize_name(a.as_ref()))
            .filter(|a| !a.is_empty())
            .collect();
        self.fellows.insert(fellow.into(), aliases);
    }
}

fn coerce_scalar(value: &Value, fellow: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(Error::Config(format!(
            "alias for '{}' must be a string, got {}",
            fellow,
            value_kind(other)
        ))),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
