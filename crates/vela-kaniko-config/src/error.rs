use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("未定義の設定です: {0}")]
    UnknownSetting(String),

    #[error("設定 {setting} の値が不正です ({source_name}): '{value}' は {expected} として解釈できません")]
    InvalidValue {
        setting: String,
        source_name: String,
        value: String,
        expected: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
