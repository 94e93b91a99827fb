//! Temp Artifact Module
//!
//! リクエスト中に作成した一時ファイル（変換済みCSV、ZIPアーカイブ）を所有し、
//! スコープを抜けた時点で必ず削除するRAIIガードを提供します。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// 一時ファイルの所有ガード
///
/// `Drop`時にファイルを削除します。正常終了、早期リターン、エラー伝播の
/// いずれの経路でも削除が実行されます。
///
/// 削除の失敗はwarnレベルでログに記録されるだけで、呼び出し側には伝播しません。
/// 既にファイルが存在しない場合は失敗とみなしません。
#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
}

impl TempArtifact {
    /// パスを一時ファイルとして登録する
    ///
    /// ファイル自体は作成しません。登録後にファイルを作成する呼び出し側は、
    /// 作成途中で失敗した場合でも部分的なファイルが削除されます。
    pub fn register(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 一時ファイルのパス
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AsRef<Path> for TempArtifact {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "released temp artifact"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to release temp artifact"
            ),
        }
    }
}
