//! Vela kaniko プラグインの設定読み込み
//!
//! 各設定は コマンドラインフラグ → 環境変数 → パラメータ/シークレットファイル → 既定値
//! の順に解決されます。

pub mod catalogue;
pub mod error;
pub mod setting;

pub use catalogue::get;
pub use error::*;
pub use setting::{PARAMETER_DIR, SECRET_DIR, Setting, Source, split_list};
