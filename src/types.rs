//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

use std::path::{Path, PathBuf};

use crate::artifact::TempArtifact;

/// ファイル拡張子から判定したスプレッドシートの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SheetKind {
    /// `.csv`（そのまま送信）
    Csv,
    /// `.xlsx` / `.xls`（CSVへ変換）
    Excel,
    /// 上記以外（単一ファイル指定時のみ到達）
    Other,
}

impl SheetKind {
    /// 拡張子（大文字小文字を区別しない）から種類を判定
    pub fn of(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("csv") => SheetKind::Csv,
            Some("xlsx") | Some("xls") => SheetKind::Excel,
            _ => SheetKind::Other,
        }
    }

    /// ディレクトリ走査の対象となる拡張子かどうか
    pub fn is_spreadsheet(self) -> bool {
        !matches!(self, SheetKind::Other)
    }
}

/// 送信またはアーカイブ可能なファイル
///
/// `path`は実際にバイト列を読み込むパス、`display_name`は下流（送信先、
/// ZIPのエントリ名）に見せる名前です。変換が行われた場合は
/// `<stem>_converted.csv`となり、`path`のファイル名とは一致しません。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub display_name: String,
}

impl FileEntry {
    pub fn new(path: impl Into<PathBuf>, display_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            display_name: display_name.into(),
        }
    }

    /// 元のファイル名をそのまま表示名とするエントリ
    pub(crate) fn passthrough(path: &Path) -> Self {
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(path, display_name)
    }
}

/// `prepare`の結果
///
/// `entries`は入力パスの順序を保ちます。`temps`は変換時に作成された一時ファイルで、
/// この値をdropすると削除されます。送信が終わるまで保持してください。
#[derive(Debug, Default)]
pub struct Prepared {
    pub entries: Vec<FileEntry>,
    pub temps: Vec<TempArtifact>,
}

impl Prepared {
    /// 送信対象が1件もないかどうか
    ///
    /// 空であることはエラーではなく、利用者に案内を返すべき通常の結果です。
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
