//! ビルド情報
//!
//! CI から渡されるイベント・コミット情報と、kaniko のスナップショット関連の設定を保持します。

use crate::error::{BuildError, BuildResult};
use std::fmt;
use std::str::FromStr;

/// タグイベントを表すイベント名
pub const TAG_EVENT: &str = "tag";

/// ファイルシステムのスナップショット方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotMode {
    Full,
    Redo,
    Time,
}

impl SnapshotMode {
    pub const ALLOWED: &'static str = "full|redo|time";

    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotMode::Full => "full",
            SnapshotMode::Redo => "redo",
            SnapshotMode::Time => "time",
        }
    }
}

impl fmt::Display for SnapshotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SnapshotMode {
    type Err = BuildError;

    /// 大文字小文字を区別せずに解析
    fn from_str(s: &str) -> BuildResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Ok(SnapshotMode::Full),
            "redo" => Ok(SnapshotMode::Redo),
            "time" => Ok(SnapshotMode::Time),
            _ => Err(BuildError::InvalidEnum {
                field: "snapshot mode",
                value: s.to_string(),
                allowed: Self::ALLOWED,
            }),
        }
    }
}

/// ビルドの設定
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// ビルドをトリガーしたイベント (push, tag, pull_request, ...)
    pub event: String,
    /// コミットの SHA-1 ハッシュ
    pub commit_sha: String,
    /// タグの参照名（tag イベントの場合のみ）
    pub tag_ref: String,
    /// スナップショット方式（未指定なら kaniko のデフォルト）
    pub snapshot_mode: Option<String>,
    pub use_new_run: bool,
    /// イメージを tar として書き出すパス
    pub tar_path: Option<String>,
    pub single_snapshot: bool,
    /// /var/run をスナップショットから除外する
    pub ignore_var_run: bool,
    pub ignore_paths: Vec<String>,
    pub log_timestamps: bool,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            event: String::new(),
            commit_sha: String::new(),
            tag_ref: String::new(),
            snapshot_mode: None,
            use_new_run: false,
            tar_path: None,
            single_snapshot: false,
            ignore_var_run: true,
            ignore_paths: Vec::new(),
            log_timestamps: false,
        }
    }
}

impl BuildInfo {
    /// tag イベントかどうか
    pub fn is_tag_event(&self) -> bool {
        self.event == TAG_EVENT
    }

    /// ビルド設定の検証
    pub fn validate(&self) -> BuildResult<()> {
        tracing::trace!("validating build plugin configuration");

        if self.event.is_empty() {
            return Err(BuildError::MissingField {
                field: "build event",
            });
        }

        if self.commit_sha.is_empty() {
            return Err(BuildError::MissingField { field: "build sha" });
        }

        if let Some(mode) = self.snapshot_mode.as_deref().filter(|m| !m.is_empty()) {
            mode.parse::<SnapshotMode>()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn build() -> BuildInfo {
        BuildInfo {
            event: "push".to_string(),
            commit_sha: "7fd1a60b01f91b314f59955a4e4d4e80d8edf11d".to_string(),
            tag_ref: "v0.0.0".to_string(),
            snapshot_mode: Some("redo".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate() {
        assert!(build().validate().is_ok());
    }

    #[test]
    fn test_validate_no_event() {
        let b = BuildInfo {
            event: String::new(),
            ..build()
        };
        let err = b.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingField);
        assert_eq!(err.to_string(), "no build event provided");
    }

    #[test]
    fn test_validate_no_sha() {
        let b = BuildInfo {
            commit_sha: String::new(),
            ..build()
        };
        let err = b.validate().unwrap_err();
        assert_eq!(err.to_string(), "no build sha provided");
    }

    #[test]
    fn test_validate_snapshot_mode_case_insensitive() {
        for mode in ["FULL", "Redo", "time"] {
            let b = BuildInfo {
                snapshot_mode: Some(mode.to_string()),
                ..build()
            };
            assert!(b.validate().is_ok(), "{} should be accepted", mode);
        }
    }

    #[test]
    fn test_validate_invalid_snapshot_mode() {
        let b = BuildInfo {
            snapshot_mode: Some("fast".to_string()),
            ..build()
        };
        let err = b.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidEnum);
        assert!(err.to_string().contains("fast"));
    }

    #[test]
    fn test_default_ignores_var_run() {
        assert!(BuildInfo::default().ignore_var_run);
    }
}
