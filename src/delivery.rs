//! Delivery Module
//!
//! 応答の送信先（チャットのトランスポート）との境界を定義するモジュール。
//! 実際のメッセージングフレームワークとの接続は`Delivery`の実装側の責務です。
//! ここではローカル確認用に、ディレクトリへ書き出す`DirectoryDelivery`を提供します。

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::SheetDropError;

/// リンクボタン
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkButton {
    pub label: String,
    pub url: String,
}

/// 送信するテキストメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingText {
    pub body: String,
    pub link: Option<LinkButton>,
}

impl OutgoingText {
    /// ボタンなしのテキスト
    pub fn plain(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            link: None,
        }
    }

    pub fn with_link(mut self, label: impl Into<String>, url: impl Into<String>) -> Self {
        self.link = Some(LinkButton {
            label: label.into(),
            url: url.into(),
        });
        self
    }
}

/// 送信するファイル
///
/// `path`は読み込み元、`file_name`は受信者に見せる名前です。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document<'a> {
    pub path: &'a Path,
    pub file_name: &'a str,
    pub caption: String,
}

/// 応答の送信先
///
/// 送信に失敗した場合は`SheetDropError::Transmission`を返してください。
/// 再送は行われません。
pub trait Delivery {
    fn send_text(&mut self, text: &OutgoingText) -> Result<(), SheetDropError>;

    fn send_document(&mut self, document: &Document<'_>) -> Result<(), SheetDropError>;
}

/// ファイルをディレクトリへコピーし、テキストをライターへ書き出す送信先
///
/// CLIからの動作確認に使用します。
#[derive(Debug)]
pub struct DirectoryDelivery<W: Write> {
    out_dir: PathBuf,
    log: W,
}

impl<W: Write> DirectoryDelivery<W> {
    pub fn new(out_dir: impl Into<PathBuf>, log: W) -> Self {
        Self {
            out_dir: out_dir.into(),
            log,
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn into_log(self) -> W {
        self.log
    }
}

impl<W: Write> Delivery for DirectoryDelivery<W> {
    fn send_text(&mut self, text: &OutgoingText) -> Result<(), SheetDropError> {
        writeln!(self.log, "{}", text.body).map_err(transmission)?;
        if let Some(link) = &text.link {
            writeln!(self.log, "[{}] {}", link.label, link.url).map_err(transmission)?;
        }
        Ok(())
    }

    fn send_document(&mut self, document: &Document<'_>) -> Result<(), SheetDropError> {
        validate_file_name(document.file_name).map_err(SheetDropError::Transmission)?;

        fs::create_dir_all(&self.out_dir).map_err(transmission)?;
        let dest = self.out_dir.join(document.file_name);
        fs::copy(document.path, &dest).map_err(transmission)?;

        writeln!(self.log, "{} -> {}", document.caption, dest.display()).map_err(transmission)?;
        Ok(())
    }
}

fn transmission(e: std::io::Error) -> SheetDropError {
    SheetDropError::Transmission(e.to_string())
}

/// 送信ファイル名の検証
///
/// 出力ディレクトリの外へ書き出さないよう、区切り文字や`..`を含む名前を拒否します。
pub(crate) fn validate_file_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Empty file name is not allowed".to_string());
    }

    if name.contains('/') || name.contains('\\') {
        return Err(format!("Path separator in file name is not allowed: {}", name));
    }

    if name == "." || name == ".." {
        return Err(format!("Path traversal detected: {}", name));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_text_with_link() {
        let dir = tempfile::tempdir().unwrap();
        let mut delivery = DirectoryDelivery::new(dir.path(), Vec::new());
        assert_eq!(delivery.out_dir(), dir.path());

        delivery
            .send_text(&OutgoingText::plain("hello").with_link("Open", "https://x.example"))
            .unwrap();

        let log = String::from_utf8(delivery.into_log()).unwrap();
        assert_eq!(log, "hello\n[Open] https://x.example\n");
    }

    #[test]
    fn test_send_document_copies_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("scratch.csv");
        fs::write(&source, "a,b\n").unwrap();
        let out = dir.path().join("outbox");

        let mut delivery = DirectoryDelivery::new(&out, Vec::new());
        delivery
            .send_document(&Document {
                path: &source,
                file_name: "port_converted.csv",
                caption: "caption".to_string(),
            })
            .unwrap();

        assert_eq!(
            fs::read_to_string(out.join("port_converted.csv")).unwrap(),
            "a,b\n"
        );
        let log = String::from_utf8(delivery.into_log()).unwrap();
        assert!(log.starts_with("caption -> "));
    }

    #[test]
    fn test_send_document_missing_source_is_transmission_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut delivery = DirectoryDelivery::new(dir.path().join("out"), Vec::new());

        let result = delivery.send_document(&Document {
            path: &dir.path().join("missing.csv"),
            file_name: "missing.csv",
            caption: String::new(),
        });
        assert!(matches!(result, Err(SheetDropError::Transmission(_))));
    }

    #[test]
    fn test_validate_file_name() {
        assert!(validate_file_name("port1.csv").is_ok());
        assert!(validate_file_name("test_portfolios.zip").is_ok());
        assert!(validate_file_name("").is_err());
        assert!(validate_file_name("..").is_err());
        assert!(validate_file_name("../etc/passwd").is_err());
        assert!(validate_file_name("dir\\file.csv").is_err());
    }
}
