//! In-memory workbook of named sheets, and a loader for the on-disk form:
//! a directory of `.tsv` files, one sheet per file, sheet name = file
//! stem.
//!
//! Cells are trimmed strings; blank lines become empty rows (the MASTER
//! sheet uses them as group separators).

use crate::error::{ModelError, Result};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// Test/builder convenience: one row of cells.
    pub fn row(mut self, cells: &[&str]) -> Self {
        self.rows.push(cells.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn blank_row(mut self) -> Self {
        self.rows.push(Vec::new());
        self
    }

    fn parse(name: &str, text: &str) -> Self {
        let rows = text
            .lines()
            .map(|line| {
                let line = line.trim_end();
                if line.trim().is_empty() {
                    Vec::new()
                } else {
                    line.split('\t').map(|cell| cell.trim().to_string()).collect()
                }
            })
            .collect();
        Self {
            name: name.to_string(),
            rows,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Read every `*.tsv` in `dir` as a sheet, sorted by file name so the
    /// sheet order is deterministic.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "tsv") {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(ModelError::Parse(format!(
                "no .tsv sheets found in {}",
                dir.display()
            )));
        }

        let mut sheets = Vec::new();
        for path in paths {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| {
                    ModelError::Parse(format!("unreadable sheet file name: {}", path.display()))
                })?
                .to_string();
            let text = fs::read_to_string(&path)?;
            sheets.push(Sheet::parse(&stem, &text));
        }
        Ok(Self { sheets })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_cells_and_blank_rows() {
        let sheet = Sheet::parse("MASTER", "a\tb\tc\n\n  \nd\te\tf\n");
        assert_eq!(sheet.rows.len(), 4);
        assert_eq!(sheet.rows[0], vec!["a", "b", "c"]);
        assert!(sheet.rows[1].is_empty());
        assert!(sheet.rows[2].is_empty());
        assert_eq!(sheet.rows[3], vec!["d", "e", "f"]);
    }

    #[test]
    fn trims_cell_whitespace() {
        let sheet = Sheet::parse("S", " a \t b\n");
        assert_eq!(sheet.rows[0], vec!["a", "b"]);
    }

    #[test]
    fn builder_shorthand() {
        let sheet = Sheet::new("S").row(&["x", "y"]).blank_row().row(&["z"]);
        assert_eq!(sheet.rows.len(), 3);
        assert_eq!(sheet.rows[2], vec!["z"]);
    }
}
