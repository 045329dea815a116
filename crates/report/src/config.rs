use serde::Deserialize;

use crate::error::ReportError;
use crate::normalize::DEFAULT_DENYLIST;

pub const DEFAULT_TITLE: &str = "JPOS Registration Report";
pub const DEFAULT_TABLE_STYLE: &str = "Table Style Medium 2";
pub const DEFAULT_OUTPUT_DIR: &str = "out";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    #[serde(default)]
    pub inputs: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub filters: FilterConfig,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Source file locations. Relative paths resolve against the config file's
/// directory.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    #[serde(default)]
    pub orders: Option<String>,
    #[serde(default)]
    pub forms: Option<String>,
    /// Worksheet to read from a spreadsheet form export (default: first).
    #[serde(default)]
    pub forms_sheet: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_table_style")]
    pub table_style: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            title: default_title(),
            table_style: default_table_style(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    /// Email local-parts that mark test submissions.
    #[serde(default = "default_denylist")]
    pub denylist: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self { denylist: default_denylist() }
    }
}

fn default_output_dir() -> String {
    DEFAULT_OUTPUT_DIR.into()
}

fn default_title() -> String {
    DEFAULT_TITLE.into()
}

fn default_table_style() -> String {
    DEFAULT_TABLE_STYLE.into()
}

fn default_denylist() -> Vec<String> {
    DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Table styles
// ---------------------------------------------------------------------------

/// Excel built-in table style family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStyleKind {
    None,
    Light(u8),
    Medium(u8),
    Dark(u8),
}

/// Parse an Excel table style name such as `Table Style Medium 2`. The
/// `Table Style` prefix is optional and matching ignores case.
pub fn parse_table_style(name: &str) -> Option<TableStyleKind> {
    let lower = name.trim().to_ascii_lowercase();
    let rest = lower.strip_prefix("table style").unwrap_or(&lower).trim();
    if rest == "none" {
        return Some(TableStyleKind::None);
    }
    let (family, number) = rest.split_once(char::is_whitespace)?;
    let n: u8 = number.trim().parse().ok()?;
    match family {
        "light" if (1..=21).contains(&n) => Some(TableStyleKind::Light(n)),
        "medium" if (1..=28).contains(&n) => Some(TableStyleKind::Medium(n)),
        "dark" if (1..=11).contains(&n) => Some(TableStyleKind::Dark(n)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReportConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReportError> {
        let config: ReportConfig =
            toml::from_str(input).map_err(|e| ReportError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReportError> {
        let title = self.output.title.trim();
        if title.is_empty() {
            return Err(ReportError::ConfigValidation("output.title must not be empty".into()));
        }
        // Title becomes part of the file name
        if title.contains(['/', '\\']) {
            return Err(ReportError::ConfigValidation(format!(
                "output.title must not contain path separators: {title:?}"
            )));
        }

        if parse_table_style(&self.output.table_style).is_none() {
            return Err(ReportError::ConfigValidation(format!(
                "unknown table style: {:?} (expected e.g. \"Table Style Medium 2\")",
                self.output.table_style
            )));
        }

        for entry in &self.filters.denylist {
            if entry.is_empty() {
                return Err(ReportError::ConfigValidation(
                    "filters.denylist entries must not be empty".into(),
                ));
            }
            if *entry != entry.to_lowercase() {
                return Err(ReportError::ConfigValidation(format!(
                    "filters.denylist entry {entry:?} must be lowercase (emails are lowercased before matching)"
                )));
            }
        }

        Ok(())
    }

    pub fn table_style(&self) -> TableStyleKind {
        parse_table_style(&self.output.table_style).unwrap_or(TableStyleKind::Medium(2))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
