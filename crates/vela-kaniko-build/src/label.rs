//! イメージラベル
//!
//! Open Container Initiative のアノテーションと Vela のビルド情報から、
//! イメージに付与するラベルを生成します。
//!
//! https://github.com/opencontainers/image-spec/blob/v1.0.1/annotations.md

use crate::error::{BuildError, BuildResult};
use regex::Regex;

pub const CREATED: &str = "org.opencontainers.image.created";
pub const URL: &str = "org.opencontainers.image.url";
pub const REVISION: &str = "org.opencontainers.image.revision";
pub const BUILD_AUTHOR: &str = "io.vela.build.author";
pub const BUILD_NUMBER: &str = "io.vela.build.number";
pub const BUILD_REPO: &str = "io.vela.build.repo";
pub const BUILD_COMMIT: &str = "io.vela.build.commit";
pub const BUILD_URL: &str = "io.vela.build.url";
pub const BUILD_LINK: &str = "io.vela.build.link";
pub const BUILD_HOST: &str = "io.vela.build.host";
pub const BUILD_TOPICS: &str = "io.vela.build.topics";

/// 自動生成されるラベルのキー（出力順）
pub const RESERVED_KEYS: [&str; 11] = [
    CREATED,
    URL,
    REVISION,
    BUILD_AUTHOR,
    BUILD_NUMBER,
    BUILD_REPO,
    BUILD_COMMIT,
    BUILD_URL,
    BUILD_LINK,
    BUILD_HOST,
    BUILD_TOPICS,
];

pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// ラベルの元になるビルド情報
#[derive(Debug, Clone, Default)]
pub struct LabelInfo {
    /// コミット作成者のメールアドレス
    pub author_email: String,
    pub commit: String,
    /// イメージのビルド時刻 (RFC 3339)
    pub created: String,
    /// リポジトリのフルネーム (org/repo)
    pub full_name: String,
    /// リポジトリの URL
    pub url: String,
    /// ビルドの URL
    pub build_url: String,
    pub host: String,
    /// ビルド番号
    pub number: i64,
    /// リポジトリのトピック
    pub topics: Vec<String>,
    /// ユーザー定義のラベル ("KEY=VALUE")
    pub custom_set: Vec<String>,
}

impl LabelInfo {
    /// フィルタ適用後のトピック
    ///
    /// フィルタは部分一致で評価します。
    pub fn effective_topics(&self, topics_filter: Option<&Regex>) -> Vec<&str> {
        self.topics
            .iter()
            .map(String::as_str)
            .filter(|topic| topics_filter.is_none_or(|re| re.is_match(topic)))
            .collect()
    }

    /// 予約済みラベルを宣言順で生成
    ///
    /// トピックラベルは、フィルタ後のトピックが空でない場合のみ含まれます。
    pub fn reserved_labels(&self, topics_filter: Option<&Regex>) -> Vec<(&'static str, String)> {
        let mut labels = vec![
            (CREATED, self.created.clone()),
            (URL, self.url.clone()),
            (REVISION, self.commit.clone()),
            (BUILD_AUTHOR, self.author_email.clone()),
            (BUILD_NUMBER, self.number.to_string()),
            (BUILD_REPO, self.full_name.clone()),
            (BUILD_COMMIT, self.commit.clone()),
            (BUILD_URL, self.url.clone()),
            (BUILD_LINK, self.build_url.clone()),
            (BUILD_HOST, self.host.clone()),
        ];

        let topics = self.effective_topics(topics_filter);
        if !topics.is_empty() {
            labels.push((BUILD_TOPICS, topics.join(",")));
        }

        labels
    }

    /// 予約済みラベルとカスタムラベルを "KEY=VALUE" 形式で生成
    ///
    /// 検証は行いません。事前に [`LabelInfo::validate_custom_set`] を呼んでください。
    pub fn render(&self, topics_filter: Option<&Regex>) -> Vec<String> {
        self.reserved_labels(topics_filter)
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .chain(self.custom_set.iter().cloned())
            .collect()
    }

    /// カスタムラベルの検証
    ///
    /// - "KEY=VALUE" 形式（`=` はちょうど1つ、キーは空でない）
    /// - 予約済みキーと衝突しない
    pub fn validate_custom_set(&self) -> BuildResult<()> {
        for entry in &self.custom_set {
            let key = custom_label_key(entry)?;

            if is_reserved(key) {
                return Err(BuildError::ReservedLabel {
                    key: key.to_string(),
                });
            }
        }

        Ok(())
    }
}

fn custom_label_key(entry: &str) -> BuildResult<&str> {
    let parts: Vec<&str> = entry.split('=').collect();

    match parts.as_slice() {
        [key, _] if !key.is_empty() => Ok(key),
        _ => Err(BuildError::InvalidFormat {
            field: "custom label",
            value: entry.to_string(),
            reason: "must be formatted as KEY=VALUE".to_string(),
        }),
    }
}
