//! プラグインが受け付ける設定の一覧

use crate::error::{ConfigError, Result};
use crate::setting::Setting;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static CATALOGUE: LazyLock<BTreeMap<&'static str, Setting>> = LazyLock::new(|| {
    let settings = vec![
        Setting::parameter("log.level", "LOG_LEVEL").default_value("info"),
        Setting::parameter("flag_set", "FLAG_SET").default_value("full"),
        // executor
        Setting::parameter("executor.path", "EXECUTOR").default_value("/kaniko/executor"),
        Setting::parameter("executor.docker_config", "DOCKER_CONFIG")
            .default_value("/kaniko/.docker/config.json"),
        // build
        Setting::parameter("build.event", "EVENT").env("VELA_BUILD_EVENT"),
        Setting::parameter("build.sha", "SHA").env("VELA_BUILD_COMMIT"),
        Setting::parameter("build.tag", "TAG").env("VELA_BUILD_TAG"),
        Setting::parameter("build.snapshot_mode", "SNAPSHOT_MODE"),
        Setting::parameter("build.use_new_run", "USE_NEW_RUN"),
        Setting::parameter("build.tar_path", "TAR_PATH"),
        Setting::parameter("build.single_snapshot", "SINGLE_SNAPSHOT"),
        Setting::parameter("build.ignore_var_run", "IGNORE_VAR_RUN").default_value("true"),
        Setting::parameter("build.ignore_path", "IGNORE_PATH"),
        Setting::parameter("build.log_timestamp", "LOG_TIMESTAMP"),
        // image
        Setting::parameter("image.build_args", "BUILD_ARGS"),
        Setting::parameter("image.context", "CONTEXT").default_value("."),
        Setting::parameter("image.dockerfile", "DOCKERFILE").default_value("Dockerfile"),
        Setting::parameter("image.target", "TARGET"),
        Setting::parameter("image.force_build_metadata", "FORCE_BUILD_METADATA"),
        Setting::parameter("image.custom_platform", "CUSTOM_PLATFORM"),
        // registry
        Setting::parameter("registry.name", "REGISTRY").default_value("index.docker.io"),
        Setting::parameter("registry.mirror", "MIRROR"),
        Setting::parameter("registry.username", "USERNAME").env("DOCKER_USERNAME"),
        Setting::parameter("registry.password", "PASSWORD").env("DOCKER_PASSWORD"),
        Setting::parameter("registry.dry_run", "DRY_RUN"),
        Setting::parameter("registry.push_retry", "PUSH_RETRY"),
        Setting::parameter("registry.insecure_registries", "INSECURE_REGISTRIES"),
        Setting::parameter("registry.insecure_pull", "INSECURE_PULL"),
        Setting::parameter("registry.insecure_push", "INSECURE_PUSH"),
        // repo
        Setting::parameter("repo.name", "REPO"),
        Setting::parameter("repo.tags", "TAGS").default_value("latest"),
        Setting::parameter("repo.auto_tag", "AUTO_TAG"),
        Setting::parameter("repo.cache", "CACHE"),
        Setting::parameter("repo.cache_name", "CACHE_REPO"),
        Setting::parameter("repo.labels", "LABELS"),
        Setting::parameter("repo.topics_filter", "TOPICS_FILTER"),
        Setting::parameter("repo.compression", "COMPRESSION"),
        Setting::parameter("repo.compression_level", "COMPRESSION_LEVEL"),
        Setting::parameter("repo.compressed_caching", "COMPRESSED_CACHING").default_value("true"),
        // label（Vela が注入する環境変数のみ）
        Setting::parameter("label.custom", "CUSTOM_LABELS"),
        Setting::new("label.author_email").env("VELA_BUILD_AUTHOR_EMAIL"),
        Setting::new("label.commit").env("VELA_BUILD_COMMIT"),
        Setting::new("label.number").env("VELA_BUILD_NUMBER"),
        Setting::new("label.full_name").env("VELA_REPO_FULL_NAME"),
        Setting::new("label.url").env("VELA_REPO_LINK"),
        Setting::new("label.build_url").env("VELA_BUILD_LINK"),
        Setting::new("label.host").env("VELA_BUILD_HOST"),
        Setting::new("label.topics").env("VELA_REPO_TOPICS"),
    ];

    settings
        .into_iter()
        .map(|setting| (setting.name(), setting))
        .collect()
});

/// 名前から設定を取得
pub fn get(name: &str) -> Result<&'static Setting> {
    CATALOGUE
        .get(name)
        .ok_or_else(|| ConfigError::UnknownSetting(name.to_string()))
}

/// 登録されているすべての設定（名前順）
pub fn all() -> impl Iterator<Item = &'static Setting> {
    CATALOGUE.values()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::path::PathBuf;

    #[test]
    fn test_get_unknown_setting() {
        let err = get("repo.nope").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSetting(name) if name == "repo.nope"));
    }

    #[test]
    fn test_vela_variables_follow_plugin_parameters() {
        let event = get("build.event").unwrap();
        assert_eq!(
            event.env_vars(),
            &[
                "PARAMETER_EVENT".to_string(),
                "KANIKO_EVENT".to_string(),
                "VELA_BUILD_EVENT".to_string(),
            ]
        );

        let password = get("registry.password").unwrap();
        assert_eq!(password.env_vars().last().unwrap(), "DOCKER_PASSWORD");
        assert_eq!(
            password.files().first().unwrap(),
            &PathBuf::from("/vela/parameters/kaniko/password")
        );
    }

    #[test]
    fn test_label_settings_are_env_only() {
        for setting in all().filter(|s| s.name().starts_with("label.") && s.name() != "label.custom")
        {
            assert_eq!(setting.env_vars().len(), 1, "{}", setting.name());
            assert!(setting.env_vars()[0].starts_with("VELA_"));
            assert!(setting.files().is_empty());
        }
    }

    #[test]
    fn test_cache_name_reads_cache_repo() {
        let cache = get("repo.cache_name").unwrap();
        assert_eq!(cache.env_vars()[0], "PARAMETER_CACHE_REPO");
    }

    #[test]
    #[serial]
    fn test_defaults() {
        temp_env::with_vars_unset(
            ["PARAMETER_REGISTRY", "KANIKO_REGISTRY", "PARAMETER_TAGS", "KANIKO_TAGS"],
            || {
                assert_eq!(
                    get("registry.name").unwrap().string(None),
                    Some("index.docker.io".to_string())
                );
                assert_eq!(get("repo.tags").unwrap().list(Vec::new()), vec!["latest"]);
            },
        );

        temp_env::with_vars_unset(
            ["PARAMETER_COMPRESSED_CACHING", "KANIKO_COMPRESSED_CACHING"],
            || {
                assert!(get("repo.compressed_caching").unwrap().bool(None).unwrap());
            },
        );
    }

    #[test]
    #[serial]
    fn test_registry_from_plugin_parameter() {
        temp_env::with_var("PARAMETER_REGISTRY", Some("ghcr.io"), || {
            assert_eq!(
                get("registry.name").unwrap().string(None),
                Some("ghcr.io".to_string())
            );
        });
    }
}
