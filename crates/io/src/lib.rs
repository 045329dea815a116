// File I/O operations

use std::path::Path;

use regrecon_report::RawTable;

pub mod csv;
pub mod xlsx;

/// Source formats recognised by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Tsv,
    Spreadsheet,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "txt" => Some(Self::Csv),
            "tsv" => Some(Self::Tsv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(Self::Spreadsheet),
            _ => None,
        }
    }
}

/// Load a source table, choosing the reader from the file extension.
/// `sheet` only applies to spreadsheets.
pub fn load_table(path: &Path, sheet: Option<&str>) -> Result<RawTable, String> {
    let format = SourceFormat::from_path(path).ok_or_else(|| {
        format!(
            "unsupported file type: {} (expected .csv, .tsv, .xlsx, .xls, .xlsb or .ods)",
            path.display()
        )
    })?;
    log::debug!("loading {} as {:?}", path.display(), format);
    let table = match format {
        SourceFormat::Csv => csv::import(path)?,
        SourceFormat::Tsv => csv::import_with_delimiter(path, b'\t')?,
        SourceFormat::Spreadsheet => xlsx::import(path, sheet)?,
    };
    log::info!("{}: {} rows, {} columns", path.display(), table.rows.len(), table.headers.len());
    Ok(table)
}
