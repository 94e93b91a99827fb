//! Responder Module
//!
//! 受信したトリガー（コマンド、挨拶、その他のテキスト）に対して、
//! リンク案内、ファイル探索、変換、アーカイブ作成、送信を順に行うモジュール。
//!
//! 1リクエスト中に作成された一時ファイルは、送信に失敗した場合も含め、
//! `respond`から戻る前にすべて削除されます。

use crate::config::BotConfig;
use crate::delivery::{Delivery, Document, OutgoingText};
use crate::error::SheetDropError;
use crate::normalize::prepare;
use crate::package::{pack, ARCHIVE_NAME};
use crate::source::resolve;
use crate::types::Prepared;

/// アーカイブ送信を起動する挨拶（前後の空白を除き、小文字化して比較）
pub const GREETING: &str = "hi";

/// 挨拶でもコマンドでもないテキストへの返答
pub const HELP_TEXT: &str = "Say 'hi' or use /start for link + ZIP.\n\
                             Commands: /zip (one ZIP) · /files (send individually)";

const FAILURE_TEXT: &str = "⚠️ Something went wrong while preparing the files. Please try again later.";

/// 受信イベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// `/start`（初回接触）
    Start,
    /// `/zip`（1つのアーカイブで送信）
    Zip,
    /// `/files`（個別に送信）
    Files,
    /// コマンド以外のテキスト
    Text(String),
}

impl Trigger {
    /// コマンド文字列（`/start`、`/zip`、`/files`）からトリガーを生成
    ///
    /// `/start@SomeBot`のようなボット名付きの形式も受け付けます。
    pub fn from_command(command: &str) -> Option<Self> {
        let name = command.trim().strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Trigger::Start),
            "zip" => Some(Trigger::Zip),
            "files" => Some(Trigger::Files),
            _ => None,
        }
    }
}

/// 挨拶かどうか
pub fn is_greeting(text: &str) -> bool {
    text.trim().to_lowercase() == GREETING
}

/// トリガーへの応答を組み立てて送信する
#[derive(Debug)]
pub struct Responder<'a> {
    config: &'a BotConfig,
}

impl<'a> Responder<'a> {
    pub fn new(config: &'a BotConfig) -> Self {
        Self { config }
    }

    /// トリガーに応答する
    ///
    /// # 戻り値
    ///
    /// * `Ok(())` - 応答を送信した場合（「ファイルが見つからない」案内を含む）
    /// * `Err(SheetDropError::Transmission)` - 送信に失敗した場合（再送しない）
    /// * `Err(SheetDropError)` - 探索・変換・アーカイブ作成で予期しない障害が発生した場合。
    ///   利用者には汎用のお詫びメッセージを送信済み
    pub fn respond<D: Delivery>(
        &self,
        trigger: &Trigger,
        delivery: &mut D,
    ) -> Result<(), SheetDropError> {
        tracing::info!(?trigger, "handling trigger");

        match trigger {
            Trigger::Start | Trigger::Zip => self.send_archive(delivery),
            Trigger::Files => self.send_files(delivery),
            Trigger::Text(text) if is_greeting(text) => self.send_archive(delivery),
            Trigger::Text(_) => delivery.send_text(&OutgoingText::plain(HELP_TEXT)),
        }
    }

    /// リンク案内のメッセージ
    pub fn link_message(&self) -> OutgoingText {
        let site = self.config.site_name();
        let url = self.config.site_url();
        let welcome = format!(
            "👋 Hey! Here’s the {site} link and test CSV files.\n\n\
             Open {site}, upload a CSV, and play with the demo portfolio."
        );

        OutgoingText::plain(format!("{}\n\n🔗 {}", welcome, url))
            .with_link(format!("🚀 Open {}", site), url)
    }

    fn send_archive<D: Delivery>(&self, delivery: &mut D) -> Result<(), SheetDropError> {
        delivery.send_text(&self.link_message())?;

        let Some(prepared) = self.prepare_or_report(delivery)? else {
            return Ok(());
        };

        let archive = self.reported(
            delivery,
            pack(&prepared.entries, self.config.scratch_dir()),
        )?;

        delivery.send_document(&Document {
            path: archive.path(),
            file_name: ARCHIVE_NAME,
            caption: format!(
                "📦 All sample portfolios (CSV). Import any one into {}.",
                self.config.site_name()
            ),
        })
        // archiveとpreparedはここでdropされ、一時ファイルが削除される
    }

    fn send_files<D: Delivery>(&self, delivery: &mut D) -> Result<(), SheetDropError> {
        delivery.send_text(&self.link_message())?;

        let Some(prepared) = self.prepare_or_report(delivery)? else {
            return Ok(());
        };

        for entry in &prepared.entries {
            delivery.send_document(&Document {
                path: &entry.path,
                file_name: &entry.display_name,
                caption: format!(
                    "📄 {}: import into {}.",
                    entry.display_name,
                    self.config.site_name()
                ),
            })?;
        }

        Ok(())
    }

    /// 探索と変換を行い、1件も無ければ案内を送って`None`を返す
    fn prepare_or_report<D: Delivery>(
        &self,
        delivery: &mut D,
    ) -> Result<Option<Prepared>, SheetDropError> {
        let source = self.config.source();
        let prepared = self.reported(
            delivery,
            resolve(source).and_then(|paths| prepare(&paths, &self.config.prepare_options())),
        )?;

        if prepared.is_empty() {
            tracing::info!(source = %source.path().display(), "no spreadsheet files found");
            delivery.send_text(&OutgoingText::plain(format!(
                "⚠️ No CSV/Excel files found at {}",
                source.hint()
            )))?;
            return Ok(None);
        }

        Ok(Some(prepared))
    }

    /// 予期しない障害をログに記録し、利用者に汎用メッセージを送る（ベストエフォート）
    fn reported<T, D: Delivery>(
        &self,
        delivery: &mut D,
        result: Result<T, SheetDropError>,
    ) -> Result<T, SheetDropError> {
        result.map_err(|e| {
            tracing::error!(error = %e, "failed to prepare files for request");
            if let Err(send_err) = delivery.send_text(&OutgoingText::plain(FAILURE_TEXT)) {
                tracing::warn!(error = %send_err, "failed to report error to user");
            }
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BotConfigBuilder;

    #[test]
    fn test_trigger_from_command() {
        assert_eq!(Trigger::from_command("/start"), Some(Trigger::Start));
        assert_eq!(Trigger::from_command("/ZIP"), Some(Trigger::Zip));
        assert_eq!(Trigger::from_command(" /files "), Some(Trigger::Files));
        assert_eq!(
            Trigger::from_command("/start@PortfolioBot"),
            Some(Trigger::Start)
        );
        assert_eq!(Trigger::from_command("/help"), None);
        assert_eq!(Trigger::from_command("start"), None);
    }

    #[test]
    fn test_is_greeting() {
        assert!(is_greeting("hi"));
        assert!(is_greeting("  Hi \n"));
        assert!(is_greeting("HI"));
        assert!(!is_greeting("hi there"));
        assert!(!is_greeting("hello"));
        assert!(!is_greeting(""));
    }

    #[test]
    fn test_link_message() {
        let config = BotConfigBuilder::new()
            .with_token("t")
            .with_site_url("https://stoxeye.example")
            .build()
            .unwrap();
        let message = Responder::new(&config).link_message();

        assert!(message.body.starts_with("👋 Hey! Here’s the StoxEye link"));
        assert!(message.body.ends_with("\n\n🔗 https://stoxeye.example"));
        let link = message.link.unwrap();
        assert_eq!(link.label, "🚀 Open StoxEye");
        assert_eq!(link.url, "https://stoxeye.example");
    }
}
