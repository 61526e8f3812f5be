use crate::auth::RegistryAuth;
use crate::error::{BuildError, BuildResult};
use std::path::Path;

/// レジストリの設定
///
/// https://docs.docker.com/registry/
#[derive(Debug, Clone, Default)]
pub struct RegistryInfo {
    /// イメージを公開するレジストリ名
    pub name: String,
    /// index.docker.io の代わりに使うミラー
    pub mirror: Option<String>,
    pub username: String,
    pub password: String,
    /// イメージを公開せずにビルドのみ行う
    pub dry_run: bool,
    /// プッシュのリトライ回数
    pub push_retry: u32,
    /// 証明書検証を行わないレジストリ
    pub insecure_registries: Vec<String>,
    pub insecure_pull: bool,
    pub insecure_push: bool,
}

impl RegistryInfo {
    pub fn validate(&self) -> BuildResult<()> {
        tracing::trace!("validating registry plugin configuration");

        if self.name.is_empty() {
            return Err(BuildError::MissingField {
                field: "registry name",
            });
        }

        if !self.dry_run {
            if self.username.is_empty() {
                return Err(BuildError::MissingField {
                    field: "registry username",
                });
            }

            if self.password.is_empty() {
                return Err(BuildError::MissingField {
                    field: "registry password",
                });
            }
        }

        Ok(())
    }

    /// 既定パスに config.json を書き出す
    pub fn write_credentials(&self) -> BuildResult<()> {
        self.write_credentials_with(&RegistryAuth::new())
    }

    /// 指定したパスに config.json を書き出す
    pub fn write_credentials_to(&self, path: &Path) -> BuildResult<()> {
        self.write_credentials_with(&RegistryAuth::with_config_path(path))
    }

    pub fn write_credentials_with(&self, auth: &RegistryAuth) -> BuildResult<()> {
        tracing::trace!("writing registry configuration file");

        auth.write(&self.name, &self.username, &self.password)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::DockerConfig;
    use crate::error::ErrorKind;
    use base64::Engine;
    use tempfile::tempdir;

    fn registry() -> RegistryInfo {
        RegistryInfo {
            name: "index.docker.io".to_string(),
            username: "octocat".to_string(),
            password: "superSecretPassword".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate() {
        assert!(registry().validate().is_ok());
    }

    #[test]
    fn test_validate_no_name() {
        let r = RegistryInfo {
            name: String::new(),
            ..registry()
        };
        assert_eq!(
            r.validate().unwrap_err().to_string(),
            "no registry name provided"
        );
    }

    #[test]
    fn test_validate_no_name_even_with_dry_run() {
        let r = RegistryInfo {
            dry_run: true,
            ..Default::default()
        };
        assert_eq!(r.validate().unwrap_err().kind(), ErrorKind::MissingField);
    }

    #[test]
    fn test_validate_no_username() {
        let r = RegistryInfo {
            username: String::new(),
            ..registry()
        };
        assert_eq!(
            r.validate().unwrap_err().to_string(),
            "no registry username provided"
        );
    }

    #[test]
    fn test_validate_no_password() {
        let r = RegistryInfo {
            password: String::new(),
            ..registry()
        };
        assert_eq!(
            r.validate().unwrap_err().to_string(),
            "no registry password provided"
        );
    }

    #[test]
    fn test_validate_dry_run_without_credentials() {
        let r = RegistryInfo {
            name: "index.docker.io".to_string(),
            dry_run: true,
            ..Default::default()
        };
        assert!(r.validate().is_ok());
    }

    #[test]
    fn test_write_credentials_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        registry().write_credentials_to(&path).unwrap();

        let config = DockerConfig::load(&path).unwrap();
        let entry = config.auths.get("index.docker.io").unwrap();
        let expected =
            base64::engine::general_purpose::STANDARD.encode("octocat:superSecretPassword");
        assert_eq!(entry.auth, expected);
        assert_eq!(config.auths.len(), 1);
    }

    #[test]
    fn test_write_credentials_dry_run_noop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let r = RegistryInfo {
            dry_run: true,
            ..Default::default()
        };

        assert!(r.write_credentials_to(&path).is_ok());
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
