//! コマンドライン引数と設定カタログからプラグインを組み立てる

use clap::Args;
use clap::builder::BoolishValueParser;
use vela_kaniko_build::{
    BuildInfo, Executor, FlagSet, ImageInfo, LabelInfo, Plugin, RegistryAuth, RegistryInfo,
    RepositoryInfo, Verbosity,
};
use vela_kaniko_config as config;

/// プラグインの設定フラグ
///
/// すべて省略可能で、省略した場合は環境変数・パラメータファイル・既定値から解決されます。
#[derive(Args, Debug, Default)]
pub struct PluginArgs {
    /// ログレベル (trace, debug, info, warn, error, fatal, panic)
    #[arg(long = "log.level")]
    pub log_level: Option<String>,

    /// 出力するフラグの範囲 (basic, full)
    #[arg(long = "flag_set")]
    pub flag_set: Option<String>,

    /// kaniko executor のパス
    #[arg(long = "executor.path")]
    pub executor_path: Option<String>,

    /// レジストリ認証ファイルの書き出し先
    #[arg(long = "executor.docker_config")]
    pub docker_config: Option<String>,

    // build
    /// ビルドイベント
    #[arg(long = "build.event")]
    pub build_event: Option<String>,
    /// コミット SHA
    #[arg(long = "build.sha")]
    pub build_sha: Option<String>,
    /// タグ参照
    #[arg(long = "build.tag")]
    pub build_tag: Option<String>,
    #[arg(long = "build.snapshot_mode")]
    pub snapshot_mode: Option<String>,
    #[arg(long = "build.use_new_run", num_args = 0..=1, default_missing_value = "true", value_parser = BoolishValueParser::new())]
    pub use_new_run: Option<bool>,
    #[arg(long = "build.tar_path")]
    pub tar_path: Option<String>,
    #[arg(long = "build.single_snapshot", num_args = 0..=1, default_missing_value = "true", value_parser = BoolishValueParser::new())]
    pub single_snapshot: Option<bool>,
    #[arg(long = "build.ignore_var_run", num_args = 0..=1, default_missing_value = "true", value_parser = BoolishValueParser::new())]
    pub ignore_var_run: Option<bool>,
    #[arg(long = "build.ignore_path", value_delimiter = ',')]
    pub ignore_path: Vec<String>,
    #[arg(long = "build.log_timestamp", num_args = 0..=1, default_missing_value = "true", value_parser = BoolishValueParser::new())]
    pub log_timestamp: Option<bool>,

    // image
    /// ビルド引数 (KEY=VALUE)
    #[arg(long = "image.build_args", value_delimiter = ',')]
    pub build_args: Vec<String>,
    /// ビルドコンテキスト
    #[arg(long = "image.context")]
    pub context: Option<String>,
    /// Dockerfile のパス
    #[arg(long = "image.dockerfile")]
    pub dockerfile: Option<String>,
    /// ビルドするステージ
    #[arg(long = "image.target")]
    pub target: Option<String>,
    #[arg(long = "image.force_build_metadata", num_args = 0..=1, default_missing_value = "true", value_parser = BoolishValueParser::new())]
    pub force_build_metadata: Option<bool>,
    #[arg(long = "image.custom_platform")]
    pub custom_platform: Option<String>,

    // registry
    /// レジストリ名
    #[arg(long = "registry.name")]
    pub registry_name: Option<String>,
    #[arg(long = "registry.mirror")]
    pub mirror: Option<String>,
    #[arg(long = "registry.username")]
    pub username: Option<String>,
    #[arg(long = "registry.password")]
    pub password: Option<String>,
    /// イメージを push しない
    #[arg(long = "registry.dry_run", num_args = 0..=1, default_missing_value = "true", value_parser = BoolishValueParser::new())]
    pub dry_run: Option<bool>,
    #[arg(long = "registry.push_retry")]
    pub push_retry: Option<u32>,
    #[arg(long = "registry.insecure_registries", value_delimiter = ',')]
    pub insecure_registries: Vec<String>,
    #[arg(long = "registry.insecure_pull", num_args = 0..=1, default_missing_value = "true", value_parser = BoolishValueParser::new())]
    pub insecure_pull: Option<bool>,
    #[arg(long = "registry.insecure_push", num_args = 0..=1, default_missing_value = "true", value_parser = BoolishValueParser::new())]
    pub insecure_push: Option<bool>,

    // repo
    /// リポジトリ名
    #[arg(long = "repo.name")]
    pub repo_name: Option<String>,
    /// 公開するタグ
    #[arg(long = "repo.tags", value_delimiter = ',')]
    pub tags: Vec<String>,
    #[arg(long = "repo.auto_tag", num_args = 0..=1, default_missing_value = "true", value_parser = BoolishValueParser::new())]
    pub auto_tag: Option<bool>,
    #[arg(long = "repo.cache", num_args = 0..=1, default_missing_value = "true", value_parser = BoolishValueParser::new())]
    pub cache: Option<bool>,
    #[arg(long = "repo.cache_name")]
    pub cache_name: Option<String>,
    #[arg(long = "repo.labels", value_delimiter = ',')]
    pub labels: Vec<String>,
    #[arg(long = "repo.topics_filter")]
    pub topics_filter: Option<String>,
    #[arg(long = "repo.compression")]
    pub compression: Option<String>,
    #[arg(long = "repo.compression_level")]
    pub compression_level: Option<i64>,
    #[arg(long = "repo.compressed_caching", num_args = 0..=1, default_missing_value = "true", value_parser = BoolishValueParser::new())]
    pub compressed_caching: Option<bool>,

    // label
    /// 追加のラベル (KEY=VALUE)
    #[arg(long = "label.custom", value_delimiter = ',')]
    pub custom_labels: Vec<String>,
}

impl PluginArgs {
    /// ログレベルを解決
    pub fn verbosity(&self) -> anyhow::Result<Verbosity> {
        let level = config::get("log.level")?.string_or_empty(self.log_level.clone());
        Ok(Verbosity::parse_lenient(&level))
    }

    /// プラグインを組み立てる
    ///
    /// `created` はイメージの作成日時ラベルに使われます。
    pub fn into_plugin(self, verbosity: Verbosity, created: String) -> anyhow::Result<Plugin> {
        let build = BuildInfo {
            event: string("build.event", self.build_event)?,
            commit_sha: string("build.sha", self.build_sha)?,
            tag_ref: string("build.tag", self.build_tag)?,
            snapshot_mode: optional("build.snapshot_mode", self.snapshot_mode)?,
            use_new_run: config::get("build.use_new_run")?.bool(self.use_new_run)?,
            tar_path: optional("build.tar_path", self.tar_path)?,
            single_snapshot: config::get("build.single_snapshot")?.bool(self.single_snapshot)?,
            ignore_var_run: config::get("build.ignore_var_run")?.bool(self.ignore_var_run)?,
            ignore_paths: config::get("build.ignore_path")?.list(self.ignore_path),
            log_timestamps: config::get("build.log_timestamp")?.bool(self.log_timestamp)?,
        };

        let image = ImageInfo {
            build_args: config::get("image.build_args")?.list(self.build_args),
            context: string("image.context", self.context)?,
            dockerfile: string("image.dockerfile", self.dockerfile)?,
            target: optional("image.target", self.target)?,
            force_build_metadata: config::get("image.force_build_metadata")?
                .bool(self.force_build_metadata)?,
            custom_platform: optional("image.custom_platform", self.custom_platform)?,
        };

        let registry = RegistryInfo {
            name: string("registry.name", self.registry_name)?,
            mirror: optional("registry.mirror", self.mirror)?,
            username: string("registry.username", self.username)?,
            password: string("registry.password", self.password)?,
            dry_run: config::get("registry.dry_run")?.bool(self.dry_run)?,
            push_retry: config::get("registry.push_retry")?.number(self.push_retry)?,
            insecure_registries: config::get("registry.insecure_registries")?
                .list(self.insecure_registries),
            insecure_pull: config::get("registry.insecure_pull")?.bool(self.insecure_pull)?,
            insecure_push: config::get("registry.insecure_push")?.bool(self.insecure_push)?,
        };

        let label = LabelInfo {
            author_email: string("label.author_email", None)?,
            commit: string("label.commit", None)?,
            created,
            full_name: string("label.full_name", None)?,
            url: string("label.url", None)?,
            build_url: string("label.build_url", None)?,
            host: string("label.host", None)?,
            number: config::get("label.number")?.number(None)?,
            topics: config::get("label.topics")?.list(Vec::new()),
            custom_set: config::get("label.custom")?.list(self.custom_labels),
        };

        let repo = RepositoryInfo {
            auto_tag: config::get("repo.auto_tag")?.bool(self.auto_tag)?,
            cache: config::get("repo.cache")?.bool(self.cache)?,
            cache_name: optional("repo.cache_name", self.cache_name)?,
            compression: optional("repo.compression", self.compression)?,
            compression_level: config::get("repo.compression_level")?
                .number(self.compression_level)?,
            compressed_caching: config::get("repo.compressed_caching")?
                .bool(self.compressed_caching)?,
            name: string("repo.name", self.repo_name)?,
            tags: config::get("repo.tags")?.list(self.tags),
            topics_filter: optional("repo.topics_filter", self.topics_filter)?,
            label,
            labels: config::get("repo.labels")?.list(self.labels),
            derived_tag: None,
        };

        let flag_set: FlagSet = string("flag_set", self.flag_set)?.parse()?;
        let executor = Executor::with_bin(string("executor.path", self.executor_path)?);
        let auth = RegistryAuth::with_config_path(string("executor.docker_config", self.docker_config)?);

        Ok(Plugin::new(build, image, registry, repo)
            .with_flag_set(flag_set)
            .with_verbosity(verbosity)
            .with_executor(executor)
            .with_auth(auth))
    }
}

fn string(name: &str, flag: Option<String>) -> anyhow::Result<String> {
    Ok(config::get(name)?.string_or_empty(flag))
}

/// 空文字列は未設定として扱う
fn optional(name: &str, flag: Option<String>) -> anyhow::Result<Option<String>> {
    Ok(config::get(name)?.string(flag).filter(|value| !value.is_empty()))
}
