//! プラグイン本体
//!
//! 設定の検証 → 認証ファイルの書き出し → executor の実行 を順に行います。

use crate::auth::RegistryAuth;
use crate::build::BuildInfo;
use crate::command::{CommandCompiler, FlagSet};
use crate::error::BuildResult;
use crate::executor::Executor;
use crate::image::ImageInfo;
use crate::registry::RegistryInfo;
use crate::repo::RepositoryInfo;
use crate::verbosity::Verbosity;

#[derive(Debug, Clone)]
pub struct Plugin {
    pub build: BuildInfo,
    pub image: ImageInfo,
    pub registry: RegistryInfo,
    pub repo: RepositoryInfo,
    pub flag_set: FlagSet,
    pub verbosity: Verbosity,
    pub executor: Executor,
    pub auth: RegistryAuth,
}

impl Plugin {
    /// プラグインを作成
    ///
    /// 自動タグ付けはここで一度だけ適用されます。
    pub fn new(
        build: BuildInfo,
        image: ImageInfo,
        registry: RegistryInfo,
        repo: RepositoryInfo,
    ) -> Self {
        let repo = repo.configure_auto_tag_build_tags(&build);

        Self {
            build,
            image,
            registry,
            repo,
            flag_set: FlagSet::default(),
            verbosity: Verbosity::default(),
            executor: Executor::new(),
            auth: RegistryAuth::new(),
        }
    }

    pub fn with_flag_set(mut self, flag_set: FlagSet) -> Self {
        self.flag_set = flag_set;
        self
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_auth(mut self, auth: RegistryAuth) -> Self {
        self.auth = auth;
        self
    }

    /// 設定の検証
    ///
    /// build → image → registry → repo の順に検証し、最初のエラーで中断します。
    pub fn validate(&self) -> BuildResult<()> {
        tracing::debug!("validating plugin configuration");

        self.build.validate()?;
        self.image.validate()?;
        self.registry.validate()?;
        self.repo.validate()?;

        Ok(())
    }

    /// kaniko に渡す引数列
    pub fn command(&self) -> Vec<String> {
        CommandCompiler::new(self.flag_set, self.verbosity).render(
            &self.build,
            &self.image,
            &self.registry,
            &self.repo,
        )
    }

    /// 認証ファイルを書き出し、executor を実行
    pub async fn exec(&self) -> BuildResult<()> {
        tracing::debug!("running plugin with provided configuration");

        self.registry.write_credentials_with(&self.auth)?;

        self.executor.version().await?;
        self.executor.run(&self.command()).await?;

        Ok(())
    }

    /// 検証してから実行
    pub async fn run(&self) -> BuildResult<()> {
        self.validate()?;
        self.exec().await
    }
}
