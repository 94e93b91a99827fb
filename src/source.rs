//! Source Resolver Module
//!
//! 設定されたパス（単一ファイルまたはディレクトリ）から、送信候補となる
//! スプレッドシートファイルを探索するモジュール。
//! 結果はキャッシュせず、呼び出しのたびに現在のディレクトリ内容を返します。

use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::SheetDropError;
use crate::types::SheetKind;

/// 探索対象のパス
///
/// 既存の通常ファイルを指す場合はそのファイルだけが対象になり、
/// それ以外はディレクトリとして扱われます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    path: PathBuf,
}

impl SourceSpec {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 利用者向けの場所の表記
    ///
    /// ファイルの場合はパスそのもの、ディレクトリの場合は`folder: <path>`。
    pub fn hint(&self) -> String {
        if self.path.is_file() {
            self.path.display().to_string()
        } else {
            format!("folder: {}", self.path.display())
        }
    }
}

/// 送信候補のファイルを探索する
///
/// # 引数
///
/// * `spec` - 探索対象のパス
///
/// # 戻り値
///
/// * `Ok(Vec<PathBuf>)` - 見つかったファイル（空の場合もエラーではない）
/// * `Err(SheetDropError::Io)` - ディレクトリの作成・走査に失敗した場合
///
/// # 探索ルール
///
/// 1. `spec`が既存の通常ファイルなら、拡張子に関係なくそのファイルだけを返す
/// 2. それ以外はディレクトリとして扱い、存在しなければ作成する
/// 3. 直下（非再帰）の`.csv` / `.xlsx` / `.xls`（大文字小文字を区別しない）を収集する。
///    `.`で始まる名前は対象外
/// 4. 重複を除き、パス文字列の小文字表記でソートする
pub fn resolve(spec: &SourceSpec) -> Result<Vec<PathBuf>, SheetDropError> {
    let path = spec.path();

    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    if path.exists() && !path.is_dir() {
        return Err(SheetDropError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "source is neither a file nor a directory: {}",
                path.display()
            ),
        )));
    }

    fs::create_dir_all(path)?;

    let mut found = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let candidate = entry.path();

        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        if !candidate.is_file() || !SheetKind::of(&candidate).is_spreadsheet() {
            continue;
        }
        found.push(candidate);
    }

    found.sort_by(|a, b| compare_case_insensitive(a, b));
    found.dedup();

    tracing::debug!(
        source = %path.display(),
        count = found.len(),
        "resolved spreadsheet sources"
    );
    Ok(found)
}

// 小文字表記で比較し、同じ場合は元の表記で順序を決める
fn compare_case_insensitive(a: &Path, b: &Path) -> Ordering {
    let la = a.to_string_lossy().to_lowercase();
    let lb = b.to_string_lossy().to_lowercase();
    la.cmp(&lb).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "x").unwrap();
        path
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_resolve_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.xlsx");
        touch(dir.path(), "A.CSV");
        touch(dir.path(), "c.xls");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "report.pdf");

        let found = resolve(&SourceSpec::new(dir.path())).unwrap();
        assert_eq!(names(&found), vec!["A.CSV", "b.xlsx", "c.xls"]);
    }

    #[test]
    fn test_resolve_single_file_any_extension() {
        let dir = tempfile::tempdir().unwrap();
        let file = touch(dir.path(), "portfolio.json");

        let found = resolve(&SourceSpec::new(&file)).unwrap();
        assert_eq!(found, vec![file]);
    }

    // 存在しないディレクトリは作成され、空の結果を返す
    #[test]
    fn test_resolve_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("sample_portfolios");

        let found = resolve(&SourceSpec::new(&missing)).unwrap();
        assert!(found.is_empty());
        assert!(missing.is_dir());
    }

    #[test]
    fn test_resolve_is_not_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        touch(&nested, "deep.csv");
        touch(dir.path(), "top.csv");

        let found = resolve(&SourceSpec::new(dir.path())).unwrap();
        assert_eq!(names(&found), vec!["top.csv"]);
    }

    #[test]
    fn test_resolve_skips_hidden_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), ".hidden.csv");
        fs::create_dir(dir.path().join("folder.csv")).unwrap();
        touch(dir.path(), "visible.csv");

        let found = resolve(&SourceSpec::new(dir.path())).unwrap();
        assert_eq!(names(&found), vec!["visible.csv"]);
    }

    // 再実行すると現在のディレクトリ内容が反映される
    #[test]
    fn test_resolve_is_restartable() {
        let dir = tempfile::tempdir().unwrap();
        let spec = SourceSpec::new(dir.path());
        touch(dir.path(), "one.csv");
        assert_eq!(resolve(&spec).unwrap().len(), 1);

        touch(dir.path(), "two.csv");
        assert_eq!(resolve(&spec).unwrap().len(), 2);
    }

    #[test]
    fn test_hint() {
        let dir = tempfile::tempdir().unwrap();
        let file = touch(dir.path(), "one.csv");

        assert_eq!(SourceSpec::new(&file).hint(), file.display().to_string());
        assert_eq!(
            SourceSpec::new(dir.path()).hint(),
            format!("folder: {}", dir.path().display())
        );
    }

    #[test]
    fn test_compare_case_insensitive_tie_break() {
        let mut paths = vec![
            PathBuf::from("b.csv"),
            PathBuf::from("a.csv"),
            PathBuf::from("A.csv"),
        ];
        paths.sort_by(|a, b| compare_case_insensitive(a, b));
        assert_eq!(
            paths,
            vec![
                PathBuf::from("A.csv"),
                PathBuf::from("a.csv"),
                PathBuf::from("b.csv")
            ]
        );
    }
}
