//! Normalizer Module
//!
//! Excelファイル（`.xlsx` / `.xls`）の最初のシートをCSVに変換し、
//! 送信可能な`FileEntry`の列を組み立てるモジュール。
//!
//! 変換に失敗したファイルはバッチ全体を止めません。`ConversionFailurePolicy`で
//! 明示された方針に従い、既定では元のファイルをそのまま含めて処理を続行します。

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::iter;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, ExcelDateTime, Range, Reader};
use chrono::Timelike;

use crate::artifact::TempArtifact;
use crate::error::SheetDropError;
use crate::types::{FileEntry, Prepared, SheetKind};

/// 変換後の表示名に付与するサフィックス
const CONVERTED_SUFFIX: &str = "_converted.csv";

/// 変換失敗時の方針
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum ConversionFailurePolicy {
    /// 警告をログに出し、元のファイルを元の名前のまま含めて続行する（デフォルト）
    ///
    /// サンプルデータ配布では、厳密さより「何かしら届くこと」を優先します。
    #[default]
    IncludeOriginal,

    /// 最初の変換失敗で処理を中断し、`SheetDropError::Conversion`を返す
    Abort,
}

/// `prepare`の設定
#[derive(Debug, Clone)]
pub struct PrepareOptions {
    /// 変換済みCSVを書き出すディレクトリ
    pub scratch_dir: PathBuf,

    /// 変換失敗時の方針
    pub on_failure: ConversionFailurePolicy,
}

impl PrepareOptions {
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            on_failure: ConversionFailurePolicy::default(),
        }
    }

    pub fn with_failure_policy(mut self, policy: ConversionFailurePolicy) -> Self {
        self.on_failure = policy;
        self
    }
}

/// 送信用のファイル一覧を組み立てる
///
/// # 引数
///
/// * `paths` - `resolve`で得たファイルパス
/// * `options` - 一時ファイルの出力先と変換失敗時の方針
///
/// # 戻り値
///
/// * `Ok(Prepared)` - `paths`の順序を保ったエントリと、作成した一時ファイル
/// * `Err(SheetDropError::Conversion)` - `ConversionFailurePolicy::Abort`で変換に失敗した場合
///
/// # 処理内容
///
/// - `.csv`: そのまま（表示名は元のファイル名）
/// - `.xlsx` / `.xls`: 最初のシートを`<scratch_dir>/<stem>.csv`へ変換し、
///   表示名を`<stem>_converted.csv`とする
/// - その他の拡張子: 対象外としてスキップ
///
/// # 使用例
///
/// ```rust,no_run
/// use sheetdrop::{prepare, resolve, PrepareOptions, SourceSpec};
///
/// # fn main() -> Result<(), sheetdrop::SheetDropError> {
/// let paths = resolve(&SourceSpec::new("sample_portfolios"))?;
/// let prepared = prepare(&paths, &PrepareOptions::new(std::env::temp_dir()))?;
/// for entry in &prepared.entries {
///     println!("{} <- {}", entry.display_name, entry.path.display());
/// }
/// // preparedをdropすると変換済みCSVが削除される
/// # Ok(())
/// # }
/// ```
pub fn prepare<P: AsRef<Path>>(
    paths: &[P],
    options: &PrepareOptions,
) -> Result<Prepared, SheetDropError> {
    let mut prepared = Prepared::default();

    for path in paths {
        let path = path.as_ref();

        match SheetKind::of(path) {
            SheetKind::Csv => prepared.entries.push(FileEntry::passthrough(path)),

            SheetKind::Excel => match convert_first_sheet(path, &options.scratch_dir) {
                Ok(artifact) => {
                    prepared
                        .entries
                        .push(FileEntry::new(artifact.path(), converted_name(path)));
                    prepared.temps.push(artifact);
                }
                Err(e) => match options.on_failure {
                    ConversionFailurePolicy::IncludeOriginal => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Excel->CSV conversion failed, sending original file"
                        );
                        prepared.entries.push(FileEntry::passthrough(path));
                    }
                    ConversionFailurePolicy::Abort => {
                        return Err(SheetDropError::conversion(path, &e));
                    }
                },
            },

            SheetKind::Other => {
                tracing::debug!(path = %path.display(), "skipping unsupported file type");
            }
        }
    }

    tracing::info!(
        entries = prepared.entries.len(),
        converted = prepared.temps.len(),
        "prepared files"
    );
    Ok(prepared)
}

/// Excelファイルの最初のシートをCSVとして書き出す
///
/// 出力先は`<scratch_dir>/<stem>.csv`（固定名）で、既存のファイルは上書きされます。
/// 返された`TempArtifact`をdropすると出力ファイルは削除されます。
/// 書き込みの途中で失敗した場合も、部分的な出力は削除されます。
pub fn convert_first_sheet(
    source: &Path,
    scratch_dir: &Path,
) -> Result<TempArtifact, SheetDropError> {
    let stem = file_stem(source)?;

    let mut workbook = open_workbook_auto(source)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SheetDropError::Parse(calamine::Error::Msg(
            "workbook has no sheets",
        )))??;

    fs::create_dir_all(scratch_dir)?;
    let artifact = TempArtifact::register(scratch_dir.join(format!("{}.csv", stem)));

    let mut writer = csv::Writer::from_path(artifact.path())?;
    write_range(&range, &mut writer)?;
    writer.flush()?;

    tracing::debug!(
        source = %source.display(),
        output = %artifact.path().display(),
        "converted first sheet to CSV"
    );
    Ok(artifact)
}

/// 変換後の表示名（`<stem>_converted.csv`）
pub(crate) fn converted_name(source: &Path) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}{}", stem, CONVERTED_SUFFIX)
}

fn file_stem(path: &Path) -> Result<String, SheetDropError> {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| SheetDropError::Conversion {
            path: path.to_path_buf(),
            message: "path has no file name".to_string(),
        })
}

/// セル範囲をCSVレコードとして書き込む
///
/// - 空白のみの行はすべて読み飛ばし、最初の非空白行をヘッダーとする
/// - 列はA列から数える（使用範囲の左側の空列も空の列として出力）
/// - 空のヘッダーセルは`Unnamed: <列番号>`とする
/// - 重複するヘッダー名は`name.1`、`name.2`と連番で区別する
fn write_range<W: Write>(
    range: &Range<Data>,
    writer: &mut csv::Writer<W>,
) -> Result<(), SheetDropError> {
    let leading = range.start().map_or(0, |(_, col)| col as usize);
    let mut rows = range.rows().filter(|row| !is_blank_row(row));

    let Some(header) = rows.next() else {
        // 空のシート
        return Ok(());
    };

    let names: Vec<String> = iter::repeat(String::new())
        .take(leading)
        .chain(header.iter().map(render_cell))
        .enumerate()
        .map(|(idx, name)| {
            if name.is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                name
            }
        })
        .collect();
    writer.write_record(dedup_names(names))?;

    for row in rows {
        writer.write_record(
            iter::repeat(String::new())
                .take(leading)
                .chain(row.iter().map(render_cell)),
        )?;
    }

    Ok(())
}

fn is_blank_row(row: &[Data]) -> bool {
    row.iter().all(|cell| match cell {
        Data::Empty => true,
        Data::String(s) => s.is_empty(),
        _ => false,
    })
}

/// 重複した列名に`.1`、`.2`...を付けて一意にする
///
/// 付与した結果が既存の名前と衝突する場合は、さらに連番を重ねます
/// （`["a", "a", "a.1"]` -> `["a", "a.1", "a.1.1"]`）。
fn dedup_names(names: Vec<String>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut unique = Vec::with_capacity(names.len());

    for mut name in names {
        let mut count = counts.get(&name).copied().unwrap_or(0);
        while count > 0 {
            counts.insert(name.clone(), count + 1);
            name = format!("{}.{}", name, count);
            count = counts.get(&name).copied().unwrap_or(0);
        }
        counts.insert(name.clone(), 1);
        unique.push(name);
    }

    unique
}

/// セル値をCSVのフィールド文字列に変換
fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => render_float(*f),
        Data::Bool(b) => if *b { "True" } else { "False" }.to_string(),
        Data::DateTime(dt) => render_datetime(dt),
        Data::Error(e) => e.to_string(),
    }
}

/// 整数値の浮動小数点数は小数部なしで出力する（`1.0` -> `1`）
fn render_float(value: f64) -> String {
    // i64で正確に表現できる範囲に限る
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// 日時セルを出力する
///
/// 時刻が0時ちょうどの場合は日付のみ（`YYYY-MM-DD`）、それ以外は
/// `YYYY-MM-DD HH:MM:SS`。期間（duration）はシリアル値のまま出力します。
fn render_datetime(dt: &ExcelDateTime) -> String {
    if dt.is_duration() {
        return render_float(dt.as_f64());
    }

    match dt.as_datetime() {
        Some(ndt) if ndt.num_seconds_from_midnight() == 0 => ndt.format("%Y-%m-%d").to_string(),
        Some(ndt) => ndt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => render_float(dt.as_f64()),
    }
}
