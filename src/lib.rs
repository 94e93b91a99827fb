//! sheetdrop - Sample spreadsheet delivery for chat bots
//!
//! ローカルのスプレッドシート（CSV / XLSX / XLS）を探索し、CSVへ正規化し、
//! 必要に応じて1つのZIPアーカイブにまとめて、チャットの送信先へ渡すクレートです。
//! チャットのトランスポート自体は`Delivery`トレイトの実装側の責務です。
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sheetdrop::{pack, prepare, resolve, PrepareOptions, SourceSpec};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scratch = std::env::temp_dir();
//!
//!     // ディレクトリ直下の .csv / .xlsx / .xls を探索
//!     let paths = resolve(&SourceSpec::new("sample_portfolios"))?;
//!
//!     // Excelは最初のシートをCSVへ変換
//!     let prepared = prepare(&paths, &PrepareOptions::new(&scratch))?;
//!
//!     // 1つのZIPにまとめる
//!     let archive = pack(&prepared.entries, &scratch)?;
//!     println!("archive: {}", archive.path().display());
//!
//!     // archiveとpreparedをdropすると一時ファイルが削除される
//!     Ok(())
//! }
//! ```
//!
//! # Responding to triggers
//!
//! ```rust,no_run
//! use sheetdrop::{BotConfig, DirectoryDelivery, Responder, Trigger};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // BOT_TOKEN, STOXEYE_URL, CSV_DIR を読み込む
//!     let config = BotConfig::from_env()?;
//!
//!     let mut delivery = DirectoryDelivery::new("outbox", std::io::stdout());
//!     Responder::new(&config).respond(&Trigger::Zip, &mut delivery)?;
//!     Ok(())
//! }
//! ```

mod artifact;
mod config;
mod delivery;
mod error;
pub mod logging;
mod normalize;
mod package;
mod responder;
mod source;
mod types;

// 公開API
pub use artifact::TempArtifact;
pub use config::{normalize_source_path, BotConfig, BotConfigBuilder};
pub use delivery::{Delivery, DirectoryDelivery, Document, LinkButton, OutgoingText};
pub use error::SheetDropError;
pub use normalize::{convert_first_sheet, prepare, ConversionFailurePolicy, PrepareOptions};
pub use package::{pack, ARCHIVE_NAME};
pub use responder::{is_greeting, Responder, Trigger, GREETING, HELP_TEXT};
pub use source::{resolve, SourceSpec};
pub use types::{FileEntry, Prepared};
