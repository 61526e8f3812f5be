use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// エラーの分類
///
/// 呼び出し側（テスト含む）がメッセージ文字列に依存せずに判定するために使う。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingField,
    InvalidEnum,
    InvalidFormat,
    RangeError,
    ConstraintViolation,
    Io,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("no {field} provided")]
    MissingField { field: &'static str },

    #[error("{field} was not a valid value: {value} - valid options ({allowed})")]
    InvalidEnum {
        field: &'static str,
        value: String,
        allowed: &'static str,
    },

    #[error("{field} '{value}' not allowed - {reason}")]
    InvalidFormat {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{field} {value} not allowed - valid range ({min}-{max})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("cache not set for cache repo: {cache_repo}")]
    CacheNotEnabled { cache_repo: String },

    #[error("custom label key '{key}' is reserved and cannot be overridden")]
    ReservedLabel { key: String },

    #[error("failed to write registry credentials to {path}: {source}")]
    Credentials {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start executor {bin}: {source}")]
    ExecutorSpawn {
        bin: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("executor failed with {status}")]
    ExecutorFailed { status: ExitStatus },

    #[error("failed to copy executor {stream}: {source}")]
    StreamCopy {
        stream: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BuildError::MissingField { .. } => ErrorKind::MissingField,
            BuildError::InvalidEnum { .. } => ErrorKind::InvalidEnum,
            BuildError::InvalidFormat { .. } => ErrorKind::InvalidFormat,
            BuildError::OutOfRange { .. } => ErrorKind::RangeError,
            BuildError::CacheNotEnabled { .. } | BuildError::ReservedLabel { .. } => {
                ErrorKind::ConstraintViolation
            }
            BuildError::Credentials { .. }
            | BuildError::ExecutorSpawn { .. }
            | BuildError::ExecutorFailed { .. }
            | BuildError::StreamCopy { .. }
            | BuildError::Io(_) => ErrorKind::Io,
        }
    }

    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            BuildError::MissingField { field } => {
                format!(
                    "{}\n\
                     \n\
                     解決方法:\n\
                     パイプラインの parameters で {} を指定してください",
                    self,
                    field
                )
            }
            BuildError::CacheNotEnabled { .. } => {
                format!(
                    "{}\n\
                     \n\
                     解決方法:\n\
                     cache_repo を使う場合は cache: true も指定してください",
                    self
                )
            }
            BuildError::ReservedLabel { .. } => {
                format!(
                    "{}\n\
                     \n\
                     解決方法:\n\
                     org.opencontainers.image.* と io.vela.build.* はプラグインが設定するため、\n\
                     別のキー名を使ってください",
                    self
                )
            }
            BuildError::ExecutorSpawn { bin, .. } => {
                format!(
                    "{}\n\
                     \n\
                     kaniko executor が {} に存在するか確認してください。",
                    self,
                    bin.display()
                )
            }
            _ => format!("{}", self),
        }
    }
}

pub type BuildResult<T> = std::result::Result<T, BuildError>;
