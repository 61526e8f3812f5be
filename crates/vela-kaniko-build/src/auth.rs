//! レジストリ認証ファイル
//!
//! kaniko executor が読み込む Docker config.json を書き出します。

use crate::error::{BuildError, BuildResult};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// kaniko が参照する config.json の既定パス
pub const DEFAULT_DOCKER_CONFIG: &str = "/kaniko/.docker/config.json";

/// Docker config.json の構造
#[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerConfig {
    /// 認証情報 (レジストリ -> AuthEntry)
    #[serde(default)]
    pub auths: BTreeMap<String, AuthEntry>,
}

/// 認証エントリ
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthEntry {
    /// Base64エンコードされた "username:password"
    pub auth: String,
}

impl DockerConfig {
    /// 単一レジストリの Basic 認証を持つ設定を作成
    pub fn with_basic_auth(registry: &str, username: &str, password: &str) -> Self {
        let auth = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", username, password));

        let mut auths = BTreeMap::new();
        auths.insert(registry.to_string(), AuthEntry { auth });

        Self { auths }
    }

    /// config.json を読み込み
    pub fn load(path: &Path) -> BuildResult<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| BuildError::InvalidFormat {
            field: "docker config",
            value: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// レジストリの認証情報を (username, password) にデコード
    pub fn credentials(&self, registry: &str) -> Option<(String, String)> {
        let entry = self.auths.get(registry)?;
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(&entry.auth)
            .ok()?;
        let auth_str = String::from_utf8(decoded).ok()?;
        let (username, password) = auth_str.split_once(':')?;
        Some((username.to_string(), password.to_string()))
    }
}

/// config.json の書き出しを管理
#[derive(Debug, Clone)]
pub struct RegistryAuth {
    config_path: PathBuf,
}

impl Default for RegistryAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryAuth {
    /// 既定パス (/kaniko/.docker/config.json) を使用
    pub fn new() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_DOCKER_CONFIG),
        }
    }

    /// 指定したパスの config.json を使用
    pub fn with_config_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// 認証情報を書き出す
    ///
    /// レジストリ名・ユーザー名・パスワードのいずれかが空の場合は何もせずに
    /// `Ok(false)` を返します（dry run や認証不要の構成を失敗させないため）。
    pub fn write(&self, registry: &str, username: &str, password: &str) -> BuildResult<bool> {
        if registry.is_empty() || username.is_empty() || password.is_empty() {
            tracing::debug!("registry credentials incomplete, skipping config.json");
            return Ok(false);
        }

        let config = DockerConfig::with_basic_auth(registry, username, password);
        let body = serde_json::to_string_pretty(&config).map_err(std::io::Error::from)?;

        if let Some(parent) = self.config_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| BuildError::Credentials {
                path: self.config_path.clone(),
                source,
            })?;
        }

        std::fs::write(&self.config_path, body).map_err(|source| BuildError::Credentials {
            path: self.config_path.clone(),
            source,
        })?;

        tracing::debug!(
            "wrote registry credentials for {} to {}",
            registry,
            self.config_path.display()
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let auth = RegistryAuth::with_config_path(&path);

        assert!(auth.write("index.docker.io", "octocat", "superSecretPassword").unwrap());

        let content = std::fs::read_to_string(&path).unwrap();
        let expected = r#"{
  "auths": {
    "index.docker.io": {
      "auth": "b2N0b2NhdDpzdXBlclNlY3JldFBhc3N3b3Jk"
    }
  }
}"#;
        assert_eq!(content, expected);
    }

    #[test]
    fn test_write_creates_parent_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".docker").join("config.json");
        let auth = RegistryAuth::with_config_path(&path);

        auth.write("ghcr.io", "octocat", "token").unwrap();

        let config = DockerConfig::load(&path).unwrap();
        assert_eq!(
            config.credentials("ghcr.io"),
            Some(("octocat".to_string(), "token".to_string()))
        );
    }

    #[test]
    fn test_write_skips_incomplete() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let auth = RegistryAuth::with_config_path(&path);

        assert!(!auth.write("index.docker.io", "", "secret").unwrap());
        assert!(!auth.write("index.docker.io", "octocat", "").unwrap());
        assert!(!auth.write("", "octocat", "secret").unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_write_fails_when_parent_is_file() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file").unwrap();

        // 親パスがファイルなのでディレクトリを作れない
        let auth = RegistryAuth::with_config_path(blocker.join("config.json"));
        let err = auth.write("index.docker.io", "octocat", "secret").unwrap_err();
        assert!(matches!(err, BuildError::Credentials { .. }));
    }

    #[test]
    fn test_credentials_password_with_colon() {
        let config = DockerConfig::with_basic_auth("quay.io", "robot", "a:b:c");
        assert_eq!(
            config.credentials("quay.io"),
            Some(("robot".to_string(), "a:b:c".to_string()))
        );
        assert_eq!(config.credentials("docker.io"), None);
    }
}
