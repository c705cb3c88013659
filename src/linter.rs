//! Annotation linting - static analysis of SmartRPC annotation files.
//!
//! Checks annotation files for:
//! - JSON syntax errors and wrong document shape
//! - Malformed type expressions
//! - Repeated names, unresolved references and unrepresentable cycles
//! - Advisory findings (naming, duplicate enum values, ...)

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{ParseError, SchemaError, Severity, ValidateError};
use crate::loader::load_document;
use crate::types::ValidateOptions;

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// Dotted path to the issue (e.g., "methods.sample_method.request.type")
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn from_schema_error(error: &SchemaError, severity: Severity, file: &Path) -> Self {
        Self {
            severity,
            code: error.code().to_string(),
            file: file.to_path_buf(),
            path: error.path().to_string(),
            message: error.message(),
        }
    }
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a directory or set of files.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// Returns true if all files passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Lint a file or directory.
///
/// If path is a directory, recursively finds all .json files. How advisory
/// findings count is decided by `options.strictness`.
pub fn lint(path: &Path, options: &ValidateOptions) -> LintResult {
    let files = collect_annotation_files(path);
    let results: Vec<FileResult> = files
        .iter()
        .map(|file| lint_file(file, path, options))
        .collect();

    let count = |severity: Severity| {
        results
            .iter()
            .flat_map(|r| &r.diagnostics)
            .filter(|d| d.severity == severity)
            .count()
    };
    let errors = count(Severity::Error);
    let warnings = count(Severity::Warning);
    let failed = results
        .iter()
        .filter(|r| r.status == FileStatus::Error)
        .count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: files.len(),
        passed: files.len() - failed,
        failed,
        errors,
        warnings,
        results,
    }
}

/// Lint a single annotation file.
pub fn lint_file(file: &Path, base_path: &Path, options: &ValidateOptions) -> FileResult {
    let diagnostics = match load_document(file) {
        Ok(document) => match document.validate(options) {
            Ok(schema) => schema
                .warnings()
                .iter()
                .map(|w| Diagnostic::from_schema_error(w, Severity::Warning, file))
                .collect(),
            Err(ValidateError::Invalid { errors, warnings }) => errors
                .iter()
                .map(|e| Diagnostic::from_schema_error(e, Severity::Error, file))
                .chain(
                    warnings
                        .iter()
                        .map(|w| Diagnostic::from_schema_error(w, Severity::Warning, file)),
                )
                .collect(),
            Err(ValidateError::Parse(err)) => parse_diagnostics(&err, file),
        },
        Err(err) => parse_diagnostics(&err, file),
    };

    let status = if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        FileStatus::Error
    } else if diagnostics.is_empty() {
        FileStatus::Ok
    } else {
        FileStatus::Warning
    };

    tracing::debug!(
        file = %file.display(),
        status = ?status,
        diagnostics = diagnostics.len(),
        "linted annotation file"
    );

    FileResult {
        file: file.strip_prefix(base_path).unwrap_or(file).to_path_buf(),
        status,
        diagnostics,
    }
}

fn parse_diagnostics(err: &ParseError, file: &Path) -> Vec<Diagnostic> {
    let diagnostic = |code: &str, path: &str, message: String| Diagnostic {
        severity: Severity::Error,
        code: code.to_string(),
        file: file.to_path_buf(),
        path: path.to_string(),
        message,
    };

    match err {
        ParseError::Malformed { errors } => errors
            .iter()
            .map(|e| Diagnostic::from_schema_error(e, Severity::Error, file))
            .collect(),
        ParseError::InvalidDocument { path, message } => {
            vec![diagnostic("P002", path.as_str(), message.clone())]
        }
        ParseError::InvalidJson { source } => {
            vec![diagnostic("P001", "", format!("syntax error: {}", source))]
        }
        other => vec![diagnostic("P001", "", other.to_string())],
    }
}

/// Collect all .json files in a path (file or directory).
fn collect_annotation_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            return vec![path.to_path_buf()];
        }
        return vec![];
    }

    let mut files = Vec::new();
    collect_files_recursive(path, &mut files);
    files.sort();
    files
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, files);
        } else if path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Strictness;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    const VALID: &str = r#"{
        "enums": {"TypeEnum": {"FIRST": "first"}},
        "objects": {"Child": {"name": "string"}},
        "methods": {"get_child": {"request": {"type": "TypeEnum"}, "response": {"child": "Child"}}}
    }"#;

    fn lint_text(content: &str, options: &ValidateOptions) -> FileResult {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        lint_file(file.path(), file.path().parent().unwrap(), options)
    }

    #[test]
    fn lint_valid_annotations() {
        let result = lint_text(VALID, &ValidateOptions::new());
        assert_eq!(result.status, FileStatus::Ok);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn lint_invalid_json_syntax() {
        let result = lint_text("{ not valid json }", &ValidateOptions::new());
        assert_eq!(result.status, FileStatus::Error);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, "P001");
    }

    #[test]
    fn lint_wrong_document_shape() {
        let result = lint_text(r#"{"methods": {"m": {"request": {}}}}"#, &ValidateOptions::new());
        assert_eq!(result.status, FileStatus::Error);
        assert_eq!(result.diagnostics[0].code, "P002");
        assert_eq!(result.diagnostics[0].path, "methods.m");
    }

    #[test]
    fn lint_malformed_type() {
        let result = lint_text(
            r#"{"methods": {"m": {"request": {"a": 5}, "response": {}}}}"#,
            &ValidateOptions::new(),
        );
        assert_eq!(result.status, FileStatus::Error);
        assert_eq!(result.diagnostics[0].code, "E001");
        assert_eq!(result.diagnostics[0].path, "methods.m.request.a");
    }

    #[test]
    fn lint_unresolved_reference() {
        let result = lint_text(
            r#"{"methods": {"m": {"request": {"a": "Missing"}, "response": {}}}}"#,
            &ValidateOptions::new(),
        );
        assert_eq!(result.status, FileStatus::Error);
        assert!(result.diagnostics.iter().any(|d| d.code == "E004"));
    }

    #[test]
    fn lint_warning_only() {
        // No methods is advisory
        let result = lint_text(
            r#"{"objects": {"Child": {"name": "string"}}}"#,
            &ValidateOptions::new(),
        );
        assert_eq!(result.status, FileStatus::Warning);
        assert!(result.diagnostics.iter().any(|d| d.code == "W005"));
    }

    #[test]
    fn lint_directory() {
        let dir = tempdir().unwrap();

        std::fs::write(dir.path().join("valid.json"), VALID).unwrap();
        std::fs::write(dir.path().join("invalid.json"), "{ not json }").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let result = lint(dir.path(), &ValidateOptions::new());
        assert_eq!(result.files_checked, 2);
        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 1);
        assert!(!result.is_ok());
    }

    #[test]
    fn lint_strictness_levels() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.json");
        // Only advisory findings: lowercase object name
        std::fs::write(
            &file_path,
            r#"{
                "objects": {"child": {"n": "int"}},
                "methods": {"m": {"request": {"c": "child"}, "response": {}}}
            }"#,
        )
        .unwrap();

        let result = lint(&file_path, &ValidateOptions::new());
        assert_eq!((result.passed, result.failed, result.warnings), (1, 0, 1));

        let strict = ValidateOptions::new().strictness(Strictness::Strict);
        let result = lint(&file_path, &strict);
        assert_eq!((result.passed, result.failed, result.errors), (0, 1, 1));

        let lenient = ValidateOptions::new().strictness(Strictness::Lenient);
        let result = lint(&file_path, &lenient);
        assert_eq!((result.passed, result.warnings), (1, 0));
    }

    #[test]
    fn lint_result_serializes() {
        let result = lint_text("{}", &ValidateOptions::new());
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "warning");
        assert_eq!(value["diagnostics"][0]["code"], "W005");
        assert_eq!(value["diagnostics"][0]["severity"], "warning");
    }
}
