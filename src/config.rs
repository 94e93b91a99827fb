//! Configuration Module
//!
//! プロセス起動時に一度だけ構築し、参照で各処理に渡す設定を定義するモジュール。
//! グローバル変数は使用しません。

use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::error::SheetDropError;
use crate::normalize::PrepareOptions;
use crate::source::SourceSpec;

/// 送信トークンの環境変数名
pub const ENV_TOKEN: &str = "BOT_TOKEN";
/// 案内リンクの環境変数名
pub const ENV_SITE_URL: &str = "STOXEYE_URL";
/// ソース（ファイルまたはディレクトリ）の環境変数名
pub const ENV_SOURCE: &str = "CSV_DIR";
/// 一時ファイル出力先の環境変数名
pub const ENV_SCRATCH_DIR: &str = "SCRATCH_DIR";

const DEFAULT_SITE_URL: &str = "https://your-stoxeye-site.example";
const DEFAULT_SITE_NAME: &str = "StoxEye";
const DEFAULT_SOURCE: &str = "sample_portfolios";

/// 検証済みの設定
#[derive(Clone)]
pub struct BotConfig {
    token: String,
    site_url: String,
    site_name: String,
    source: SourceSpec,
    scratch_dir: PathBuf,
}

impl BotConfig {
    /// 環境変数から設定を読み込む
    ///
    /// `BOT_TOKEN`は必須です。未設定の場合は`SheetDropError::Config`を返します。
    pub fn from_env() -> Result<Self, SheetDropError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意の参照関数から設定を読み込む
    ///
    /// # 読み込む値
    ///
    /// - `BOT_TOKEN`: 必須。前後の空白を除去
    /// - `STOXEYE_URL`: 省略時は`https://your-stoxeye-site.example`
    /// - `CSV_DIR`: 省略時は`sample_portfolios`。引用符の除去、`~`の展開、正規化を行う
    /// - `SCRATCH_DIR`: 省略時はOSの一時ディレクトリ
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SheetDropError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let home = lookup("HOME");
        let raw_source = lookup(ENV_SOURCE).unwrap_or_else(|| DEFAULT_SOURCE.to_string());

        let mut builder = BotConfigBuilder::new()
            .with_token(lookup(ENV_TOKEN).unwrap_or_default())
            .with_source(normalize_source_path(&raw_source, home.as_deref()));

        if let Some(url) = lookup(ENV_SITE_URL) {
            builder = builder.with_site_url(url);
        }
        if let Some(dir) = lookup(ENV_SCRATCH_DIR).filter(|d| !d.trim().is_empty()) {
            builder = builder.with_scratch_dir(dir.trim());
        }

        builder.build()
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    pub fn site_name(&self) -> &str {
        &self.site_name
    }

    pub fn source(&self) -> &SourceSpec {
        &self.source
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// `prepare`に渡す設定（変換失敗時は元ファイルを含める既定の方針）
    pub fn prepare_options(&self) -> PrepareOptions {
        PrepareOptions::new(&self.scratch_dir)
    }
}

// トークンはログに出さない
impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"***")
            .field("site_url", &self.site_url)
            .field("site_name", &self.site_name)
            .field("source", &self.source)
            .field("scratch_dir", &self.scratch_dir)
            .finish()
    }
}

/// `BotConfig`を段階的に構築するビルダー
///
/// # 使用例
///
/// ```rust,no_run
/// use sheetdrop::BotConfigBuilder;
///
/// # fn main() -> Result<(), sheetdrop::SheetDropError> {
/// let config = BotConfigBuilder::new()
///     .with_token("123:abc")
///     .with_site_url("https://stoxeye.example")
///     .with_source("sample_portfolios")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct BotConfigBuilder {
    token: String,
    site_url: String,
    site_name: String,
    source: PathBuf,
    scratch_dir: PathBuf,
}

impl Default for BotConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BotConfigBuilder {
    /// デフォルト設定を持つビルダーを生成する
    ///
    /// トークンは空のため、`with_token`を呼ばずに`build`すると失敗します。
    pub fn new() -> Self {
        Self {
            token: String::new(),
            site_url: DEFAULT_SITE_URL.to_string(),
            site_name: DEFAULT_SITE_NAME.to_string(),
            source: PathBuf::from(DEFAULT_SOURCE),
            scratch_dir: std::env::temp_dir(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// 送信テキストにそのまま埋め込まれるURL
    pub fn with_site_url(mut self, url: impl Into<String>) -> Self {
        self.site_url = url.into();
        self
    }

    /// キャプションとボタンに表示するサイト名
    pub fn with_site_name(mut self, name: impl Into<String>) -> Self {
        self.site_name = name.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    /// 設定を検証し、`BotConfig`を生成する
    ///
    /// # 発生し得るエラー
    ///
    /// * `SheetDropError::Config(String)`:
    ///   * トークンが空
    ///   * URLが空
    ///   * ソースパスが空
    pub fn build(self) -> Result<BotConfig, SheetDropError> {
        let token = self.token.trim().to_string();
        if token.is_empty() {
            return Err(SheetDropError::Config(format!(
                "{} is not set; provide the bot token",
                ENV_TOKEN
            )));
        }

        let site_url = self.site_url.trim().to_string();
        if site_url.is_empty() {
            return Err(SheetDropError::Config(format!("{} is empty", ENV_SITE_URL)));
        }

        if self.source.as_os_str().is_empty() {
            return Err(SheetDropError::Config(format!("{} is empty", ENV_SOURCE)));
        }

        Ok(BotConfig {
            token,
            site_url,
            site_name: self.site_name,
            source: SourceSpec::new(self.source),
            scratch_dir: self.scratch_dir,
        })
    }
}

/// ソースパスの表記を整える
///
/// 1. 前後の空白と引用符（`"`、`'`）を除去
/// 2. 先頭の`~`を`home`で展開
/// 3. `.`と`..`を字句的に解決（ファイルシステムには問い合わせない）
pub fn normalize_source_path(raw: &str, home: Option<&str>) -> PathBuf {
    let trimmed = raw.trim().trim_matches('"').trim_matches('\'');

    let expanded = match (trimmed.strip_prefix('~'), home) {
        (Some(""), Some(home)) => PathBuf::from(home),
        (Some(rest), Some(home)) if rest.starts_with('/') || rest.starts_with('\\') => {
            PathBuf::from(home).join(&rest[1..])
        }
        _ => PathBuf::from(trimmed),
    };

    lexical_normalize(&expanded)
}

fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }

    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}
