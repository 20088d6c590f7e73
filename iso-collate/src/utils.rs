use hashbrown::HashMap;
use indexmap::IndexMap;
use log::info;
use thiserror::Error;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use config::{GROUP_SEP, MEMBER_SEP, TSV_DELIMITER};

use crate::record::TsvRecord;

/// member -> group id, in first-seen member order
pub type GroupMapping = IndexMap<String, String>;
pub type RecordMapping<R> = HashMap<String, R>;

#[derive(Debug, Error)]
pub enum CollateError {
    #[error("cannot read {path:?}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed line {line} in {path:?}: {msg}")]
    Parse {
        path: PathBuf,
        line: u64,
        msg: String,
    },
    #[error("column '{column}' not found in the header of {path:?}")]
    Schema { path: PathBuf, column: &'static str },
    #[error("isoform {0} is missing from the on-target file")]
    Lookup(String),
}

/// Reads a `<group>\t<member,member,...>` file into member -> group.
///
/// A member listed under several groups keeps the last one. Empty members
/// are skipped; a line without exactly two tab-separated fields, blank
/// lines included, is an error.
pub fn read_group_info<P: AsRef<Path>>(path: P) -> Result<GroupMapping, CollateError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| CollateError::File {
        path: path.to_path_buf(),
        source,
    })?;

    let mut mapping = GroupMapping::new();
    let mut groups = 0;

    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| CollateError::File {
            path: path.to_path_buf(),
            source,
        })?;
        let line = line.trim();
        let (group, members) = split_group_line(line).ok_or_else(|| CollateError::Parse {
            path: path.to_path_buf(),
            line: idx as u64 + 1,
            msg: format!(
                "expected 2 tab-separated fields, found {}",
                line.split(GROUP_SEP).count()
            ),
        })?;

        members
            .split(MEMBER_SEP)
            .filter(|member| !member.is_empty())
            .for_each(|member| {
                mapping.insert(member.to_string(), group.to_string());
            });
        groups += 1;
    }

    info!(
        "Members parsed from {}: {} in {} groups",
        path.display(),
        mapping.len(),
        groups
    );

    Ok(mapping)
}

#[inline(always)]
fn split_group_line(line: &str) -> Option<(&str, &str)> {
    let mut fields = line.split(GROUP_SEP);
    match (fields.next(), fields.next(), fields.next()) {
        (Some(group), Some(members), None) => Some((group, members)),
        _ => None,
    }
}

/// Reads a headed TSV file into `R::key()` -> record.
///
/// The header must carry every column in `R::REQUIRED`; extra columns, and
/// trailing fields past the header, are ignored. Duplicate keys keep the last row.
pub fn read_records<R, P>(path: P) -> Result<RecordMapping<R>, CollateError>
where
    R: TsvRecord,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| CollateError::File {
        path: path.to_path_buf(),
        source,
    })?;

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(TSV_DELIMITER)
        .flexible(true)
        .from_reader(file);

    let headers = rdr
        .headers()
        .map_err(|e| parse_error(path, &e))?
        .clone();

    if let Some(column) = R::REQUIRED
        .iter()
        .copied()
        .find(|column| !headers.iter().any(|h| h == *column))
    {
        return Err(CollateError::Schema {
            path: path.to_path_buf(),
            column,
        });
    }

    let mut records = RecordMapping::new();
    for result in rdr.deserialize() {
        let record: R = result.map_err(|e| parse_error(path, &e))?;
        records.insert(record.key(), record);
    }

    info!(
        "Records parsed from {} [key: {}]: {}",
        path.display(),
        R::KEY,
        records.len()
    );

    Ok(records)
}

fn parse_error(path: &Path, err: &csv::Error) -> CollateError {
    CollateError::Parse {
        path: path.to_path_buf(),
        line: err.position().map(|p| p.line()).unwrap_or_default(),
        msg: err.to_string(),
    }
}
