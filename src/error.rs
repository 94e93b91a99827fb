//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use std::path::PathBuf;
use thiserror::Error;

/// sheetdropクレート全体で使用するエラー型
///
/// ソースの探索、CSVへの正規化、ZIPの作成、送信処理中に発生する
/// すべてのエラーを統一的に扱うために使用されます。
///
/// # エラーの種類
///
/// - `Io`: I/O操作中に発生したエラー（ディレクトリ走査の失敗など）
/// - `Parse`: スプレッドシートの解析中に発生したエラー（calamine由来）
/// - `Csv` / `Zip`: 出力ファイルの書き込み中に発生したエラー
/// - `Config`: 起動時の設定検証に失敗したエラー（致命的）
/// - `Conversion`: 単一ファイルの変換失敗（既定のポリシーでは回復される）
/// - `Transmission`: `Delivery`実装が報告した送信失敗
///
/// 「ファイルが見つからない」はエラーではありません。`Prepared::is_empty()`で判定します。
#[derive(Error, Debug)]
pub enum SheetDropError {
    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// スプレッドシートの解析中に発生したエラー
    ///
    /// ファイル形式が不正、破損したファイルなどが原因となります。
    #[error("Failed to parse spreadsheet: {0}")]
    Parse(#[from] calamine::Error),

    /// CSVの書き込みエラー
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// ZIPアーカイブの書き込みエラー
    #[error("ZIP archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// 設定の検証に失敗したエラー
    ///
    /// `BotConfigBuilder::build()`時に発生します。例えば、`BOT_TOKEN`が
    /// 空の場合などです。このエラーが返された場合、プロセスは起動してはいけません。
    ///
    /// # 例
    ///
    /// ```rust,no_run
    /// use sheetdrop::{BotConfigBuilder, SheetDropError};
    ///
    /// match BotConfigBuilder::new().build() {
    ///     Err(SheetDropError::Config(msg)) => eprintln!("設定エラー: {}", msg),
    ///     _ => {}
    /// }
    /// ```
    #[error("Configuration error: {0}")]
    Config(String),

    /// 単一のスプレッドシートの変換に失敗したエラー
    #[error("Failed to convert '{}': {message}", .path.display())]
    Conversion {
        /// 変換元のファイルパス
        path: PathBuf,
        /// エラーの詳細メッセージ
        message: String,
    },

    /// 送信処理の失敗
    ///
    /// 再送は行いません。一時ファイルの削除だけが保証されます。
    #[error("Transmission failed: {0}")]
    Transmission(String),
}

impl SheetDropError {
    /// 変換失敗として包み直す
    pub(crate) fn conversion(path: impl Into<PathBuf>, source: &SheetDropError) -> Self {
        SheetDropError::Conversion {
            path: path.into(),
            message: source.to_string(),
        }
    }
}
