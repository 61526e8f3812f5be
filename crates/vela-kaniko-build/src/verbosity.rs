use std::fmt;
use tracing::level_filters::LevelFilter;

/// ログの詳細度
///
/// プラグイン自身のログレベルと、kaniko に渡す `--verbosity` の両方に使います。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Panic,
    Fatal,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl Verbosity {
    /// ログレベル文字列を解析
    ///
    /// 短縮形 (t, d, i, w, e, f, p) と大文字小文字の違いを許容し、
    /// 解釈できない値は info として扱います。
    pub fn parse_lenient(level: &str) -> Self {
        match level.trim().to_ascii_lowercase().as_str() {
            "t" | "trace" => Verbosity::Trace,
            "d" | "debug" => Verbosity::Debug,
            "w" | "warn" => Verbosity::Warn,
            "e" | "error" => Verbosity::Error,
            "f" | "fatal" => Verbosity::Fatal,
            "p" | "panic" => Verbosity::Panic,
            _ => Verbosity::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Panic => "panic",
            Verbosity::Fatal => "fatal",
            Verbosity::Error => "error",
            Verbosity::Warn => "warn",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
            Verbosity::Trace => "trace",
        }
    }

    /// tracing のレベルフィルタ（fatal/panic は error に丸める）
    pub fn level_filter(&self) -> LevelFilter {
        match self {
            Verbosity::Panic | Verbosity::Fatal | Verbosity::Error => LevelFilter::ERROR,
            Verbosity::Warn => LevelFilter::WARN,
            Verbosity::Info => LevelFilter::INFO,
            Verbosity::Debug => LevelFilter::DEBUG,
            Verbosity::Trace => LevelFilter::TRACE,
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
