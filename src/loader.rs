//! Loading annotation documents from files and strings.

use std::path::Path;

use crate::document::SchemaDocument;
use crate::error::{ParseError, ValidateError};
use crate::schema::ValidatedSchema;
use crate::types::ValidateOptions;

/// Load and parse a document from a file path.
///
/// # Errors
///
/// Returns `ParseError::FileNotFound` if the file doesn't exist,
/// `ParseError::ReadError` if it can't be read, or any parse error.
pub fn load_document(path: &Path) -> Result<SchemaDocument, ParseError> {
    if !path.exists() {
        return Err(ParseError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ParseError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    SchemaDocument::parse_str(&content)
}

/// Load, parse and validate a document from a file path.
///
/// # Errors
///
/// Returns `ValidateError::Parse` if loading or parsing fails, or
/// `ValidateError::Invalid` if validation fails.
pub fn load_schema(
    path: &Path,
    options: &ValidateOptions,
) -> Result<ValidatedSchema, ValidateError> {
    let document = load_document(path)?;
    document.validate(options)
}

/// Parse and validate a document from a JSON string.
///
/// # Errors
///
/// Same as [`load_schema`], without the IO errors.
pub fn load_schema_str(
    content: &str,
    options: &ValidateOptions,
) -> Result<ValidatedSchema, ValidateError> {
    let document = SchemaDocument::parse_str(content)?;
    document.validate(options)
}
