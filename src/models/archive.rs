use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{DriveError, Result};

/// Name of the archive folder kept directly under the drive root
pub const ARCHIVE_ROOT_NAME: &str = "facturas";

/// Depth used when rendering the whole archive (root, year, month, type, files)
pub const DEFAULT_TREE_DEPTH: usize = 4;

const MONTH_NAMES: [&str; 12] = [
    "ENERO",
    "FEBRERO",
    "MARZO",
    "ABRIL",
    "MAYO",
    "JUNIO",
    "JULIO",
    "AGOSTO",
    "SEPTIEMBRE",
    "OCTUBRE",
    "NOVIEMBRE",
    "DICIEMBRE",
];

/// Document-type folder at the bottom of the archive taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    #[serde(rename = "facturas_emitidas")]
    Issued,
    #[serde(rename = "facturas_recibidas")]
    Received,
}

impl DocumentKind {
    pub fn folder_name(&self) -> &'static str {
        match self {
            DocumentKind::Issued => "facturas_emitidas",
            DocumentKind::Received => "facturas_recibidas",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder_name())
    }
}

impl FromStr for DocumentKind {
    type Err = DriveError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "facturas_emitidas" => Ok(DocumentKind::Issued),
            "facturas_recibidas" => Ok(DocumentKind::Received),
            other => Err(DriveError::invalid_path(format!(
                "unknown document type '{}', expected facturas_emitidas or facturas_recibidas",
                other
            ))),
        }
    }
}

/// Folder name for a calendar month, e.g. `1` -> `01ENERO`
pub fn month_folder_name(month: u32) -> Result<String> {
    if !(1..=12).contains(&month) {
        return Err(DriveError::invalid_path(format!("month {} is out of range 1-12", month)));
    }
    Ok(format!("{:02}{}", month, MONTH_NAMES[(month - 1) as usize]))
}

/// One descent through the archive: root / year / month / document type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePath {
    pub year: String,
    pub month: String,
    pub kind: DocumentKind,
}

impl ArchivePath {
    /// Builds a path from folder names exactly as callers supply them
    pub fn new(year: impl Into<String>, month: impl Into<String>, kind: DocumentKind) -> Self {
        Self {
            year: year.into(),
            month: month.into(),
            kind,
        }
    }

    /// Builds a path from a numeric year and month using the archive naming
    pub fn for_month(year: i32, month: u32, kind: DocumentKind) -> Result<Self> {
        Ok(Self::new(year.to_string(), month_folder_name(month)?, kind))
    }

    pub fn segments(&self) -> Vec<String> {
        vec![
            ARCHIVE_ROOT_NAME.to_string(),
            self.year.clone(),
            self.month.clone(),
            self.kind.folder_name().to_string(),
        ]
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments().join("/"))
    }
}
