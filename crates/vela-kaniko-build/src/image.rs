use crate::error::{BuildError, BuildResult};

/// イメージのビルド時パラメータ
#[derive(Debug, Clone, Default)]
pub struct ImageInfo {
    /// ビルド時に渡す変数 ("KEY=VALUE")
    pub build_args: Vec<String>,
    /// ビルドコンテキストのパス
    pub context: String,
    /// Dockerfile のパス
    pub dockerfile: String,
    /// マルチステージビルドのターゲット
    pub target: Option<String>,
    pub force_build_metadata: bool,
    /// ビルド対象プラットフォーム (例: linux/arm64)
    pub custom_platform: Option<String>,
}

impl ImageInfo {
    pub fn validate(&self) -> BuildResult<()> {
        tracing::trace!("validating image plugin configuration");

        if self.context.is_empty() {
            return Err(BuildError::MissingField {
                field: "image context",
            });
        }

        if self.dockerfile.is_empty() {
            return Err(BuildError::MissingField {
                field: "image dockerfile",
            });
        }

        Ok(())
    }
}
