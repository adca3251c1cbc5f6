//! Whitespace-delimited source description files.
//!
//! With a header row, columns are named:
//!
//! ```text
//! id  pan        cam
//! a   pan_a.tif  cam_a.tsai
//! b   pan_b.tif  cam_b.tsai
//! ```
//!
//! Without one, columns are assigned left to right to
//! `id pan ms cam mp cam-ms pleiades`.

use std::fs;
use std::path::Path;

use super::errors::{ResolveError, ResolveResult};
use crate::config::SourceRecord;
use crate::models::{SourceField, CANONICAL_COLUMNS};

/// Read source records from a file.
pub fn read_source_file(path: &Path, header: bool) -> ResolveResult<Vec<SourceRecord>> {
    let content = fs::read_to_string(path).map_err(|e| ResolveError::read(path, e))?;
    parse_source_rows(path, &content, header)
}

/// Parse source records from file content. `path` is only used in errors.
pub fn parse_source_rows(
    path: &Path,
    content: &str,
    header: bool,
) -> ResolveResult<Vec<SourceRecord>> {
    let mut rows = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.split_whitespace().collect::<Vec<_>>()))
        .filter(|(_, tokens)| !tokens.is_empty());

    let columns: Vec<Option<SourceField>> = if header {
        let (_, names) = rows
            .next()
            .ok_or_else(|| ResolveError::EmptySourceFile(path.to_path_buf()))?;
        header_columns(path, &names)?
    } else {
        Vec::new()
    };

    let mut records = Vec::new();
    let mut expected = if header { Some(columns.len()) } else { None };

    for (line, tokens) in rows {
        let width = *expected.get_or_insert(tokens.len());
        if tokens.len() != width {
            return Err(ResolveError::InconsistentRows {
                path: path.to_path_buf(),
                line,
                expected: width,
                found: tokens.len(),
            });
        }

        let record = if header {
            record_from_named(&columns, &tokens)
        } else {
            record_from_positional(path, &tokens)?
        };
        records.push(record);
    }

    if records.is_empty() {
        return Err(ResolveError::EmptySourceFile(path.to_path_buf()));
    }
    Ok(records)
}

/// Map header names to fields. `None` marks the id column.
fn header_columns(path: &Path, names: &[&str]) -> ResolveResult<Vec<Option<SourceField>>> {
    let mut has_id = false;
    let mut columns = Vec::with_capacity(names.len());
    for name in names {
        if *name == "id" {
            has_id = true;
            columns.push(None);
        } else {
            let field = SourceField::from_key(name).ok_or_else(|| ResolveError::UnknownColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            })?;
            columns.push(Some(field));
        }
    }
    if !has_id {
        return Err(ResolveError::MissingIdColumn(path.to_path_buf()));
    }
    Ok(columns)
}

fn record_from_named(columns: &[Option<SourceField>], tokens: &[&str]) -> SourceRecord {
    let mut record = SourceRecord::default();
    for (column, value) in columns.iter().zip(tokens) {
        record = match column {
            None => SourceRecord {
                id: value.to_string(),
                ..record
            },
            Some(field) => record.with(*field, *value),
        };
    }
    record
}

fn record_from_positional(path: &Path, tokens: &[&str]) -> ResolveResult<SourceRecord> {
    if tokens.len() > CANONICAL_COLUMNS.len() {
        return Err(ResolveError::TooManyColumns {
            path: path.to_path_buf(),
            found: tokens.len(),
            max: CANONICAL_COLUMNS.len(),
        });
    }

    let mut values = tokens.iter();
    let mut record = SourceRecord::default();
    if let Some(id) = values.next() {
        record.id = id.to_string();
    }
    for (field, value) in SourceField::ALL.iter().zip(values) {
        record = record.with(*field, *value);
    }
    Ok(record)
}
