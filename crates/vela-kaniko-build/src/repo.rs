//! リポジトリ設定
//!
//! 公開先リポジトリ・タグ・キャッシュ・圧縮の設定と、ビルド情報からの自動タグ付けを扱います。

use crate::build::BuildInfo;
use crate::error::{BuildError, BuildResult};
use crate::label::LabelInfo;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Docker タグの構文
///
/// - 先頭は英数字またはアンダースコア
/// - 以降は英数字、アンダースコア、ピリオド、ハイフン
/// - 最大128文字
///
/// https://github.com/distribution/distribution/blob/main/reference/regexp.go
static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}$").expect("tag regex is valid")
});

const TAG_HINT: &str = "see https://docs.docker.com/engine/reference/commandline/tag/#extended-description";

pub const COMPRESSION_LEVEL_MIN: i64 = 1;
pub const COMPRESSION_LEVEL_MAX: i64 = 9;

/// タグが Docker のタグ構文に従っているか
pub fn is_valid_tag(tag: &str) -> bool {
    TAG_REGEX.is_match(tag)
}

/// レイヤーの圧縮方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Zstd,
}

impl Compression {
    pub const ALLOWED: &'static str = "gzip|zstd";

    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::Gzip => "gzip",
            Compression::Zstd => "zstd",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Compression {
    type Err = BuildError;

    fn from_str(s: &str) -> BuildResult<Self> {
        match s {
            "gzip" => Ok(Compression::Gzip),
            "zstd" => Ok(Compression::Zstd),
            _ => Err(BuildError::InvalidEnum {
                field: "compression",
                value: s.to_string(),
                allowed: Self::ALLOWED,
            }),
        }
    }
}

/// リポジトリの設定
#[derive(Debug, Clone)]
pub struct RepositoryInfo {
    /// コミットまたはタグからイメージタグを自動付与する
    pub auto_tag: bool,
    /// レイヤーキャッシュを有効にする
    pub cache: bool,
    /// キャッシュ用のリポジトリ（cache が有効な場合のみ指定可能）
    pub cache_name: Option<String>,
    pub compression: Option<String>,
    /// 圧縮レベル (0 は未指定)
    pub compression_level: i64,
    pub compressed_caching: bool,
    /// イメージのリポジトリ名
    pub name: String,
    /// ユーザーが指定したタグ
    pub tags: Vec<String>,
    /// トピックラベルに含めるトピックの正規表現
    pub topics_filter: Option<String>,
    pub label: LabelInfo,
    /// 追加ラベル ("KEY=VALUE")
    pub labels: Vec<String>,
    /// 自動タグ付けで導出されたタグ
    ///
    /// [`RepositoryInfo::configure_auto_tag_build_tags`] が設定します。
    pub derived_tag: Option<String>,
}

impl Default for RepositoryInfo {
    fn default() -> Self {
        Self {
            auto_tag: false,
            cache: false,
            cache_name: None,
            compression: None,
            compression_level: 0,
            compressed_caching: true,
            name: String::new(),
            tags: Vec::new(),
            topics_filter: None,
            label: LabelInfo::default(),
            labels: Vec::new(),
            derived_tag: None,
        }
    }
}

impl RepositoryInfo {
    /// ビルド情報から自動タグを導出
    ///
    /// auto_tag が有効な場合、tag イベントならタグ参照名、それ以外ならコミット SHA を
    /// 導出タグとして記録します。導出タグは上書きされるため、何度呼んでも結果は同じです。
    pub fn configure_auto_tag_build_tags(mut self, build: &BuildInfo) -> Self {
        if !self.auto_tag {
            return self;
        }

        let tag = if build.is_tag_event() {
            build.tag_ref.clone()
        } else {
            build.commit_sha.clone()
        };

        tracing::debug!("auto tagging image with {}", tag);
        self.derived_tag = Some(tag);
        self
    }

    /// 指定タグと導出タグを順に返す
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags
            .iter()
            .map(String::as_str)
            .chain(self.derived_tag.as_deref())
    }

    /// キャッシュ用リポジトリ（未指定ならリポジトリ名）
    pub fn cache_repo(&self) -> &str {
        self.cache_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.name)
    }

    /// "<name>:<tag>" 形式の公開先
    pub fn destinations(&self) -> Vec<String> {
        self.tags()
            .map(|tag| format!("{}:{}", self.name, tag))
            .collect()
    }

    /// トピックフィルタをコンパイル
    pub fn topics_regex(&self) -> BuildResult<Option<Regex>> {
        match self.topics_filter.as_deref().filter(|f| !f.is_empty()) {
            Some(filter) => Regex::new(filter)
                .map(Some)
                .map_err(|e| BuildError::InvalidFormat {
                    field: "topics filter",
                    value: filter.to_string(),
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    /// 追加ラベルと生成ラベルを結合
    ///
    /// 検証は行いません。topics_filter の妥当性は [`RepositoryInfo::validate`] で
    /// 確認済みである前提で、コンパイルできないフィルタは警告を出したうえで無視し、
    /// トピックを絞り込まずに出力します。
    pub fn render_labels(&self) -> Vec<String> {
        let filter = match self.topics_regex() {
            Ok(filter) => filter,
            Err(e) => {
                tracing::warn!("ignoring topics filter: {}", e);
                None
            }
        };

        self.labels
            .iter()
            .cloned()
            .chain(self.label.render(filter.as_ref()))
            .collect()
    }

    pub fn validate(&self) -> BuildResult<()> {
        tracing::trace!("validating repo plugin configuration");

        if let Some(cache_name) = self.cache_name.as_deref().filter(|n| !n.is_empty())
            && !self.cache
        {
            return Err(BuildError::CacheNotEnabled {
                cache_repo: cache_name.to_string(),
            });
        }

        if self.name.is_empty() {
            return Err(BuildError::MissingField { field: "repo name" });
        }

        if !self.auto_tag && self.tags.is_empty() {
            return Err(BuildError::MissingField { field: "repo tags" });
        }

        if let Some(tag) = self.tags().find(|tag| !is_valid_tag(tag)) {
            return Err(BuildError::InvalidFormat {
                field: "tag",
                value: tag.to_string(),
                reason: TAG_HINT.to_string(),
            });
        }

        self.topics_regex()?;

        if let Some(compression) = self.compression.as_deref().filter(|c| !c.is_empty()) {
            compression.parse::<Compression>()?;
        }

        if self.compression_level != 0
            && !(COMPRESSION_LEVEL_MIN..=COMPRESSION_LEVEL_MAX).contains(&self.compression_level)
        {
            return Err(BuildError::OutOfRange {
                field: "compression level",
                value: self.compression_level,
                min: COMPRESSION_LEVEL_MIN,
                max: COMPRESSION_LEVEL_MAX,
            });
        }

        self.label.validate_custom_set()?;

        Ok(())
    }
}
