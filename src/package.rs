//! Packager Module
//!
//! `FileEntry`の列を1つのZIPアーカイブ（Deflate圧縮）にまとめるモジュール。

use std::fs::File;
use std::io;
use std::path::Path;

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::artifact::TempArtifact;
use crate::error::SheetDropError;
use crate::types::FileEntry;

/// アーカイブのファイル名（送信時の表示名も兼ねる）
pub const ARCHIVE_NAME: &str = "test_portfolios.zip";

/// エントリをZIPアーカイブにまとめる
///
/// # 引数
///
/// * `entries` - アーカイブに含めるファイル
/// * `scratch_dir` - アーカイブの出力先ディレクトリ
///
/// # 戻り値
///
/// * `Ok(TempArtifact)` - `<scratch_dir>/test_portfolios.zip`。dropすると削除される
/// * `Err(SheetDropError)` - 書き込みに失敗した場合（部分的なファイルは削除済み）
///
/// # アーカイブ形式
///
/// - エントリ名は`FileEntry::display_name`（ディレクトリ構造、マニフェストなし）
/// - パック時点で存在しないファイルは黙ってスキップ
/// - 既存のアーカイブは上書き
/// - `entries`が空の場合も、エントリ数0の有効なアーカイブを作成
pub fn pack(entries: &[FileEntry], scratch_dir: &Path) -> Result<TempArtifact, SheetDropError> {
    std::fs::create_dir_all(scratch_dir)?;
    let artifact = TempArtifact::register(scratch_dir.join(ARCHIVE_NAME));

    let mut zip = ZipWriter::new(File::create(artifact.path())?);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut packed = 0usize;
    for entry in entries {
        if !entry.path.is_file() {
            tracing::debug!(
                path = %entry.path.display(),
                "entry vanished before packing, skipping"
            );
            continue;
        }

        let mut source = File::open(&entry.path)?;
        zip.start_file(entry.display_name.as_str(), options)?;
        io::copy(&mut source, &mut zip)?;
        packed += 1;
    }

    zip.finish()?;

    tracing::info!(
        archive = %artifact.path().display(),
        entries = packed,
        "packed archive"
    );
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read;
    use zip::ZipArchive;

    fn entry_names(path: &Path) -> Vec<String> {
        let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        archive.file_names().map(str::to_string).collect()
    }

    #[test]
    fn test_pack_empty() {
        let dir = tempfile::tempdir().unwrap();
        let archive = pack(&[], dir.path()).unwrap();

        assert_eq!(archive.path(), dir.path().join(ARCHIVE_NAME));
        assert!(entry_names(archive.path()).is_empty());
    }

    #[test]
    fn test_pack_uses_display_names_and_deflate() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("scratch_port2.csv");
        fs::write(&source, "a,b\n1,2\n").unwrap();

        let archive = pack(
            &[FileEntry::new(&source, "port2_converted.csv")],
            dir.path(),
        )
        .unwrap();

        let mut zip = ZipArchive::new(File::open(archive.path()).unwrap()).unwrap();
        assert_eq!(zip.len(), 1);
        let mut file = zip.by_name("port2_converted.csv").unwrap();
        assert_eq!(file.compression(), CompressionMethod::Deflated);
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        assert_eq!(content, "a,b\n1,2\n");
    }

    // パック時点で消えているファイルはスキップされる
    #[test]
    fn test_pack_skips_missing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.csv");
        fs::write(&present, "x\n").unwrap();

        let archive = pack(
            &[
                FileEntry::new(dir.path().join("gone.csv"), "gone.csv"),
                FileEntry::new(&present, "present.csv"),
            ],
            dir.path(),
        )
        .unwrap();

        assert_eq!(entry_names(archive.path()), vec!["present.csv"]);
    }

    #[test]
    fn test_pack_overwrites_previous_archive() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(ARCHIVE_NAME), b"stale bytes").unwrap();

        let archive = pack(&[], dir.path()).unwrap();
        assert!(entry_names(archive.path()).is_empty());
    }

    #[test]
    fn test_archive_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let archive = pack(&[], dir.path()).unwrap();
            archive.path().to_path_buf()
        };
        assert!(!path.exists());
    }
}
