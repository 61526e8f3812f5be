//! 設定値の解決
//!
//! 1つの設定は、名前・環境変数のリスト・ファイルパスのリスト・既定値を持ちます。
//! 値は以下の優先順位で解決されます:
//! 1. コマンドラインフラグ
//! 2. 環境変数（リストの先頭から、最初に設定されているもの）
//! 3. ファイル（リストの先頭から、最初に読み込めたもの）
//! 4. 既定値

use crate::error::{ConfigError, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// パラメータファイルの配置先
pub const PARAMETER_DIR: &str = "/vela/parameters/kaniko";
/// シークレットファイルの配置先
pub const SECRET_DIR: &str = "/vela/secrets/kaniko";

/// 値の取得元
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Flag,
    Env(String),
    File(PathBuf),
    Default,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Flag => write!(f, "flag"),
            Source::Env(var) => write!(f, "env {}", var),
            Source::File(path) => write!(f, "file {}", path.display()),
            Source::Default => write!(f, "default"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Setting {
    name: &'static str,
    env: Vec<String>,
    files: Vec<PathBuf>,
    default: Option<&'static str>,
}

impl Setting {
    /// 環境変数・ファイルを持たない設定を作成
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            env: Vec::new(),
            files: Vec::new(),
            default: None,
        }
    }

    /// プラグインパラメータとして設定を作成
    ///
    /// `key` が `CACHE_REPO` の場合:
    /// - 環境変数: PARAMETER_CACHE_REPO, KANIKO_CACHE_REPO
    /// - ファイル: /vela/parameters/kaniko/cache_repo, /vela/secrets/kaniko/cache_repo
    pub fn parameter(name: &'static str, key: &str) -> Self {
        let file_name = key.to_ascii_lowercase();

        Self::new(name)
            .env(format!("PARAMETER_{}", key))
            .env(format!("KANIKO_{}", key))
            .file(PathBuf::from(PARAMETER_DIR).join(&file_name))
            .file(PathBuf::from(SECRET_DIR).join(&file_name))
    }

    pub fn env(mut self, var: impl Into<String>) -> Self {
        self.env.push(var.into());
        self
    }

    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    pub fn default_value(mut self, value: &'static str) -> Self {
        self.default = Some(value);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn env_vars(&self) -> &[String] {
        &self.env
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// 環境変数・ファイル・既定値から値を探す（フラグは含まない）
    ///
    /// 空の環境変数と空のファイルは未設定として扱います。
    pub fn lookup(&self) -> Option<(String, Source)> {
        for var in &self.env {
            if let Ok(value) = std::env::var(var)
                && !value.is_empty()
            {
                return Some((value, Source::Env(var.clone())));
            }
        }

        for path in &self.files {
            match std::fs::read_to_string(path) {
                Ok(content) if !content.trim().is_empty() => {
                    return Some((content.trim().to_string(), Source::File(path.clone())));
                }
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::debug!("skipping unreadable file {}: {}", path.display(), e);
                }
            }
        }

        self.default
            .map(|value| (value.to_string(), Source::Default))
    }

    /// 文字列として解決
    pub fn string(&self, flag: Option<String>) -> Option<String> {
        self.resolve(flag).map(|(value, _)| value)
    }

    /// 文字列として解決（見つからなければ空文字列）
    pub fn string_or_empty(&self, flag: Option<String>) -> String {
        self.string(flag).unwrap_or_default()
    }

    /// カンマ区切りのリストとして解決
    ///
    /// フラグで1つ以上の値が指定されていればそれを使います。
    pub fn list(&self, flag: Vec<String>) -> Vec<String> {
        if !flag.is_empty() {
            return flag;
        }

        self.lookup()
            .map(|(value, _)| split_list(&value))
            .unwrap_or_default()
    }

    /// 真偽値として解決
    pub fn bool(&self, flag: Option<bool>) -> Result<bool> {
        if let Some(value) = flag {
            return Ok(value);
        }

        match self.lookup() {
            Some((value, source)) => parse_bool(&value).ok_or_else(|| ConfigError::InvalidValue {
                setting: self.name.to_string(),
                source_name: source.to_string(),
                value,
                expected: "bool",
            }),
            None => Ok(false),
        }
    }

    /// 数値として解決（見つからなければ `T::default()`）
    pub fn number<T>(&self, flag: Option<T>) -> Result<T>
    where
        T: FromStr + Default,
    {
        if let Some(value) = flag {
            return Ok(value);
        }

        match self.lookup() {
            Some((value, source)) => value.parse().map_err(|_| ConfigError::InvalidValue {
                setting: self.name.to_string(),
                source_name: source.to_string(),
                value,
                expected: "number",
            }),
            None => Ok(T::default()),
        }
    }

    fn resolve(&self, flag: Option<String>) -> Option<(String, Source)> {
        if let Some(value) = flag {
            return Some((value, Source::Flag));
        }

        let found = self.lookup();
        if let Some((_, source)) = &found {
            tracing::trace!("resolved {} from {}", self.name, source);
        }
        found
    }
}

/// カンマ区切りの値を分割（空要素は除外）
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "t" => Some(true),
        "false" | "0" | "no" | "f" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    fn test_parameter_sources() {
        let setting = Setting::parameter("repo.cache_name", "CACHE_REPO");
        assert_eq!(
            setting.env_vars(),
            &["PARAMETER_CACHE_REPO".to_string(), "KANIKO_CACHE_REPO".to_string()]
        );
        assert_eq!(
            setting.files(),
            &[
                PathBuf::from("/vela/parameters/kaniko/cache_repo"),
                PathBuf::from("/vela/secrets/kaniko/cache_repo"),
            ]
        );
    }

    #[test]
    #[serial]
    fn test_flag_wins_over_env() {
        let setting = Setting::new("build.event").env("TEST_KANIKO_EVENT");

        temp_env::with_var("TEST_KANIKO_EVENT", Some("push"), || {
            assert_eq!(setting.string(Some("tag".to_string())), Some("tag".to_string()));
            assert_eq!(setting.string(None), Some("push".to_string()));
        });
    }

    #[test]
    #[serial]
    fn test_first_env_wins() {
        let setting = Setting::new("build.sha")
            .env("TEST_PARAMETER_SHA")
            .env("TEST_VELA_BUILD_COMMIT");

        temp_env::with_vars(
            [
                ("TEST_PARAMETER_SHA", Some("abc")),
                ("TEST_VELA_BUILD_COMMIT", Some("def")),
            ],
            || {
                assert_eq!(setting.string(None), Some("abc".to_string()));
            },
        );

        temp_env::with_vars(
            [
                ("TEST_PARAMETER_SHA", None),
                ("TEST_VELA_BUILD_COMMIT", Some("def")),
            ],
            || {
                assert_eq!(setting.string(None), Some("def".to_string()));
            },
        );
    }

    #[test]
    #[serial]
    fn test_env_wins_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry");
        fs::write(&path, "ghcr.io\n").unwrap();

        let setting = Setting::new("registry.name")
            .env("TEST_PARAMETER_REGISTRY")
            .file(&path);

        temp_env::with_var("TEST_PARAMETER_REGISTRY", Some("quay.io"), || {
            assert_eq!(setting.string(None), Some("quay.io".to_string()));
        });

        temp_env::with_var_unset("TEST_PARAMETER_REGISTRY", || {
            let (value, source) = setting.lookup().unwrap();
            assert_eq!(value, "ghcr.io");
            assert_eq!(source, Source::File(path.clone()));
        });
    }

    #[test]
    fn test_first_existing_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("parameters").join("password");
        let secret = dir.path().join("password");
        fs::write(&secret, "superSecretPassword").unwrap();

        let setting = Setting::new("registry.password").file(&missing).file(&secret);
        assert_eq!(
            setting.string(None),
            Some("superSecretPassword".to_string())
        );
    }

    #[test]
    #[serial]
    fn test_empty_env_is_skipped() {
        let setting = Setting::new("build.tag")
            .env("TEST_VELA_BUILD_TAG")
            .default_value("fallback");

        temp_env::with_var("TEST_VELA_BUILD_TAG", Some(""), || {
            assert_eq!(setting.string(None), Some("fallback".to_string()));
        });
    }

    #[test]
    fn test_blank_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let parameter = dir.path().join("context");
        let secret = dir.path().join("secret_context");
        fs::write(&parameter, "  \n").unwrap();

        let setting = Setting::new("image.context")
            .file(&parameter)
            .default_value(".");
        assert_eq!(setting.lookup(), Some((".".to_string(), Source::Default)));

        fs::write(&secret, "docker/\n").unwrap();
        let setting = Setting::new("image.context")
            .file(&parameter)
            .file(&secret)
            .default_value(".");
        assert_eq!(
            setting.lookup(),
            Some(("docker/".to_string(), Source::File(secret.clone())))
        );
    }

    #[test]
    fn test_default_value() {
        let setting = Setting::new("image.context").default_value(".");
        assert_eq!(setting.lookup(), Some((".".to_string(), Source::Default)));
        assert_eq!(Setting::new("image.target").string(None), None);
    }

    #[test]
    #[serial]
    fn test_list_from_env() {
        let setting = Setting::new("repo.tags")
            .env("TEST_PARAMETER_TAGS")
            .default_value("latest");

        temp_env::with_var("TEST_PARAMETER_TAGS", Some("latest, v1.0.0,,stable"), || {
            assert_eq!(setting.list(Vec::new()), vec!["latest", "v1.0.0", "stable"]);
            assert_eq!(setting.list(vec!["dev".to_string()]), vec!["dev"]);
        });

        temp_env::with_var_unset("TEST_PARAMETER_TAGS", || {
            assert_eq!(setting.list(Vec::new()), vec!["latest"]);
        });
    }

    #[test]
    #[serial]
    fn test_bool() {
        let setting = Setting::new("registry.dry_run").env("TEST_PARAMETER_DRY_RUN");

        temp_env::with_var("TEST_PARAMETER_DRY_RUN", Some("TRUE"), || {
            assert!(setting.bool(None).unwrap());
            assert!(!setting.bool(Some(false)).unwrap());
        });

        temp_env::with_var("TEST_PARAMETER_DRY_RUN", Some("sometimes"), || {
            let err = setting.bool(None).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { .. }));
            assert!(err.to_string().contains("registry.dry_run"));
        });

        temp_env::with_var_unset("TEST_PARAMETER_DRY_RUN", || {
            assert!(!setting.bool(None).unwrap());
        });
    }

    #[test]
    fn test_bool_default_true() {
        let setting = Setting::new("build.ignore_var_run").default_value("true");
        assert!(setting.bool(None).unwrap());
    }

    #[test]
    #[serial]
    fn test_number() {
        let setting = Setting::new("registry.push_retry").env("TEST_PARAMETER_PUSH_RETRY");

        temp_env::with_var("TEST_PARAMETER_PUSH_RETRY", Some("3"), || {
            assert_eq!(setting.number::<u32>(None).unwrap(), 3);
        });

        temp_env::with_var("TEST_PARAMETER_PUSH_RETRY", Some("three"), || {
            assert!(setting.number::<u32>(None).is_err());
        });

        temp_env::with_var_unset("TEST_PARAMETER_PUSH_RETRY", || {
            assert_eq!(setting.number::<u32>(None).unwrap(), 0);
        });
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("a,b , c"), vec!["a", "b", "c"]);
        assert!(split_list("").is_empty());
    }
}
