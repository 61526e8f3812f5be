//! kaniko コマンドの組み立て
//!
//! 検証済みの設定から kaniko executor に渡す引数列を決定的な順序で生成します。

use crate::build::{BuildInfo, SnapshotMode};
use crate::error::{BuildError, BuildResult};
use crate::image::ImageInfo;
use crate::registry::RegistryInfo;
use crate::repo::RepositoryInfo;
use crate::verbosity::Verbosity;
use std::str::FromStr;

/// 出力するフラグの範囲
///
/// `Basic` はレジストリへの公開に必要な最小限のフラグのみを出力します。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlagSet {
    Basic,
    #[default]
    Full,
}

impl FlagSet {
    pub fn is_full(&self) -> bool {
        matches!(self, FlagSet::Full)
    }
}

impl FromStr for FlagSet {
    type Err = BuildError;

    fn from_str(s: &str) -> BuildResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "basic" => Ok(FlagSet::Basic),
            "full" => Ok(FlagSet::Full),
            _ => Err(BuildError::InvalidEnum {
                field: "flag set",
                value: s.to_string(),
                allowed: "basic|full",
            }),
        }
    }
}

/// 設定から kaniko の引数列を生成する
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandCompiler {
    flag_set: FlagSet,
    verbosity: Verbosity,
}

impl CommandCompiler {
    pub fn new(flag_set: FlagSet, verbosity: Verbosity) -> Self {
        Self {
            flag_set,
            verbosity,
        }
    }

    /// 引数列を生成（実行ファイルのパスは含まない）
    ///
    /// 検証は行いません。呼び出し前に各設定の `validate` を済ませてください。
    pub fn render(
        &self,
        build: &BuildInfo,
        image: &ImageInfo,
        registry: &RegistryInfo,
        repo: &RepositoryInfo,
    ) -> Vec<String> {
        tracing::debug!("creating kaniko command from plugin configuration");

        let full = self.flag_set.is_full();
        let mut flags = Vec::new();

        if full {
            push_build_flags(&mut flags, build);
        }

        for arg in &image.build_args {
            flags.push(format!("--build-arg={}", arg));
        }

        if repo.cache {
            flags.push("--cache".to_string());
            flags.push(format!("--cache-repo={}", repo.cache_repo()));
        }

        flags.push(format!("--context={}", image.context));

        if full {
            push_compression_flags(&mut flags, repo);
        }

        for destination in repo.destinations() {
            flags.push(format!("--destination={}", destination));
        }

        if full {
            for label in repo.render_labels() {
                flags.push(format!("--label={}", label));
            }
        }

        flags.push(format!("--dockerfile={}", image.dockerfile));

        if registry.dry_run {
            flags.push("--no-push".to_string());
        }

        if full {
            push_registry_flags(&mut flags, image, registry);
        }

        flags.push(format!("--verbosity={}", self.verbosity));

        tracing::debug!("kaniko flags: {:?}", flags);
        flags
    }
}

fn push_build_flags(flags: &mut Vec<String>, build: &BuildInfo) {
    if let Some(mode) = non_empty(&build.snapshot_mode) {
        // 検証済みの値は小文字に正規化して渡す
        let mode = mode
            .parse::<SnapshotMode>()
            .map(|m| m.as_str())
            .unwrap_or(mode);
        flags.push(format!("--snapshot-mode={}", mode));
    }

    if build.use_new_run {
        flags.push("--use-new-run".to_string());
    }

    if let Some(path) = non_empty(&build.tar_path) {
        flags.push(format!("--tar-path={}", path));
    }

    if build.single_snapshot {
        flags.push("--single-snapshot".to_string());
    }

    flags.push(format!("--ignore-var-run={}", build.ignore_var_run));

    for path in &build.ignore_paths {
        flags.push(format!("--ignore-path={}", path));
    }

    if build.log_timestamps {
        flags.push("--log-timestamp".to_string());
    }
}

fn push_compression_flags(flags: &mut Vec<String>, repo: &RepositoryInfo) {
    if let Some(compression) = non_empty(&repo.compression) {
        flags.push(format!("--compression={}", compression));
    }

    if repo.compression_level != 0 {
        flags.push(format!("--compression-level={}", repo.compression_level));
    }

    if !repo.compressed_caching {
        flags.push("--compressed-caching=false".to_string());
    }
}

fn push_registry_flags(flags: &mut Vec<String>, image: &ImageInfo, registry: &RegistryInfo) {
    if let Some(mirror) = non_empty(&registry.mirror) {
        flags.push(format!("--registry-mirror={}", mirror));
    }

    if registry.push_retry > 0 {
        flags.push(format!("--push-retry={}", registry.push_retry));
    }

    if let Some(target) = non_empty(&image.target) {
        flags.push(format!("--target={}", target));
    }

    if let Some(platform) = non_empty(&image.custom_platform) {
        flags.push(format!("--custom-platform={}", platform));
    }

    if image.force_build_metadata {
        flags.push("--force-build-metadata".to_string());
    }

    for insecure in &registry.insecure_registries {
        flags.push(format!("--insecure-registry={}", insecure));
    }

    if registry.insecure_pull {
        flags.push("--insecure-pull".to_string());
    }

    if registry.insecure_push {
        flags.push("--insecure".to_string());
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
