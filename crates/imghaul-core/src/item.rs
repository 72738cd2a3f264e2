//! Resolving raw index records into items.
//!
//! The field layout of the index is caller-defined: an ordered set of
//! identity field indices and a url field index (negative counts from the
//! end). Both are validated into a [`FieldSpec`] once at startup so a bad
//! spec string fails fast instead of on the first record.

use thiserror::Error;

use crate::error::ConfigError;
use crate::index::Record;

/// Separator used to join identity fields.
const ID_SEPARATOR: &str = "$";

/// Typed field configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Ordered identity field indices
    pub id_fields: Vec<usize>,

    /// Url field index; negative addresses from the end of the record
    pub url_field: isize,
}

impl FieldSpec {
    /// Parse a comma-separated id field spec (e.g. `"0,2"`) and a url
    /// field index into a validated spec.
    pub fn parse(id_spec: &str, url_field: isize) -> Result<Self, ConfigError> {
        let mut id_fields = Vec::new();
        for part in id_spec.split(',') {
            let part = part.trim();
            let index = part
                .parse::<usize>()
                .map_err(|source| ConfigError::IdFieldParse {
                    value: part.to_string(),
                    source,
                })?;
            id_fields.push(index);
        }
        Ok(Self {
            id_fields,
            url_field,
        })
    }
}

/// An item resolved from one record. Derived fresh per record, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Identity fields joined with `$`
    pub identity: String,

    /// The raw (not yet normalized) source url field
    pub source_url: String,
}

/// Why a record could not be resolved.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Per-record: the record has no fields, so no url can be addressed
    #[error("line {line}: empty record")]
    EmptyRecord { line: u64 },

    /// Startup-class misconfiguration: an id field points past the end of
    /// the record. Non-recoverable for the whole run.
    #[error("id field index {index} is out of bounds for a record of {len} fields")]
    IdFieldOutOfBounds { index: usize, len: usize },
}

impl ResolveError {
    /// Whether this error must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ResolveError::IdFieldOutOfBounds { .. })
    }
}

/// Resolve a record into an item using the given field spec.
pub fn resolve(record: &Record, spec: &FieldSpec) -> Result<Item, ResolveError> {
    if record.fields.is_empty() {
        return Err(ResolveError::EmptyRecord { line: record.line });
    }

    let mut parts = Vec::with_capacity(spec.id_fields.len());
    for &index in &spec.id_fields {
        let field = record
            .fields
            .get(index)
            .ok_or(ResolveError::IdFieldOutOfBounds {
                index,
                len: record.fields.len(),
            })?;
        parts.push(field.as_str());
    }

    // url field wraps modulo record length to allow negative-from-end
    // addressing; emptiness was ruled out above so the modulo is non-zero
    let source_url = pick_url_field(&record.fields, spec.url_field)
        .expect("non-empty record always yields a url index");

    Ok(Item {
        identity: parts.join(ID_SEPARATOR),
        source_url: source_url.to_string(),
    })
}

/// Address the url field of a record, wrapping negative indices from the
/// end. Returns `None` for an empty record.
pub fn pick_url_field(fields: &[String], url_field: isize) -> Option<&str> {
    if fields.is_empty() {
        return None;
    }
    let len = fields.len() as isize;
    let index = url_field.rem_euclid(len) as usize;
    Some(fields[index].as_str())
}
