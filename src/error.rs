//! Error types for SmartRPC schema parsing, validation and payload checks.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::types::DeclKind;

/// Severity level of a [`SchemaError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single defect in a schema document, located by a dotted path such as
/// `methods.sample_method.request.selected_days`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaError {
    MalformedType {
        path: String,
        reason: String,
    },
    DuplicateDeclaration {
        path: String,
        name: String,
        existing: DeclKind,
    },
    DuplicateKey {
        path: String,
        key: String,
    },
    UnresolvedReference {
        path: String,
        name: String,
    },
    UnrepresentableCycle {
        path: String,
        chain: Vec<String>,
    },
    EmptyEnumValue {
        path: String,
    },
    ReservedName {
        path: String,
        name: String,
    },
    NamingConvention {
        path: String,
        name: String,
        expected: &'static str,
    },
    DuplicateEnumValue {
        path: String,
        value: String,
        first: String,
    },
    NameCollision {
        path: String,
        name: String,
    },
    ShadowsPrimitive {
        path: String,
        name: String,
    },
    NoMethods {
        path: String,
    },
}

impl SchemaError {
    /// Path to the offending declaration or field.
    pub fn path(&self) -> &str {
        match self {
            Self::MalformedType { path, .. }
            | Self::DuplicateDeclaration { path, .. }
            | Self::DuplicateKey { path, .. }
            | Self::UnresolvedReference { path, .. }
            | Self::UnrepresentableCycle { path, .. }
            | Self::EmptyEnumValue { path }
            | Self::ReservedName { path, .. }
            | Self::NamingConvention { path, .. }
            | Self::DuplicateEnumValue { path, .. }
            | Self::NameCollision { path, .. }
            | Self::ShadowsPrimitive { path, .. }
            | Self::NoMethods { path } => path,
        }
    }

    /// Stable diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedType { .. } => "E001",
            Self::DuplicateDeclaration { .. } => "E002",
            Self::DuplicateKey { .. } => "E003",
            Self::UnresolvedReference { .. } => "E004",
            Self::UnrepresentableCycle { .. } => "E005",
            Self::EmptyEnumValue { .. } => "E006",
            Self::ReservedName { .. } => "E007",
            Self::NamingConvention { .. } => "W001",
            Self::DuplicateEnumValue { .. } => "W002",
            Self::NameCollision { .. } => "W003",
            Self::ShadowsPrimitive { .. } => "W004",
            Self::NoMethods { .. } => "W005",
        }
    }

    /// Inherent severity. Advisory findings are warnings unless strict
    /// validation promotes them.
    pub fn severity(&self) -> Severity {
        if self.is_advisory() {
            Severity::Warning
        } else {
            Severity::Error
        }
    }

    pub fn is_advisory(&self) -> bool {
        matches!(
            self,
            Self::NamingConvention { .. }
                | Self::DuplicateEnumValue { .. }
                | Self::NameCollision { .. }
                | Self::ShadowsPrimitive { .. }
                | Self::NoMethods { .. }
        )
    }

    /// Human-readable message without the path.
    pub fn message(&self) -> String {
        match self {
            Self::MalformedType { reason, .. } => format!("malformed type: {}", reason),
            Self::DuplicateDeclaration { name, existing, .. } => {
                format!("'{}' is already declared as {}", name, existing)
            }
            Self::DuplicateKey { key, .. } => format!("duplicate key '{}'", key),
            Self::UnresolvedReference { name, .. } => {
                format!("'{}' is not a primitive, enum or object", name)
            }
            Self::UnrepresentableCycle { chain, .. } => {
                format!("unrepresentable cycle {}", chain.join(" -> "))
            }
            Self::EmptyEnumValue { .. } => "enum value must be a non-empty string".to_string(),
            Self::ReservedName { name, .. } => {
                format!("'{}' is a primitive type name and cannot be declared", name)
            }
            Self::NamingConvention { name, expected, .. } => {
                format!("'{}' should be {}", name, expected)
            }
            Self::DuplicateEnumValue { value, first, .. } => {
                format!("value \"{}\" is already used by member '{}'", value, first)
            }
            Self::NameCollision { name, .. } => {
                format!("method '{}' shares its name with an enum or object", name)
            }
            Self::ShadowsPrimitive { name, .. } => {
                format!("field '{}' shadows a primitive type name", name)
            }
            Self::NoMethods { .. } => "document declares no methods".to_string(),
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path(), self.message())
    }
}

impl std::error::Error for SchemaError {}

/// Errors while turning raw input into a [`SchemaDocument`](crate::SchemaDocument).
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid document at {path}: {message}")]
    InvalidDocument { path: String, message: String },

    #[error("malformed schema with {} error(s)", errors.len())]
    Malformed { errors: Vec<SchemaError> },
}

/// Errors from parsing plus validating a document.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("validation failed with {} error(s)", errors.len())]
    Invalid {
        errors: Vec<SchemaError>,
        warnings: Vec<SchemaError>,
    },
}

impl ValidateError {
    /// All located defects carried by this error, errors first.
    pub fn schema_errors(&self) -> Vec<&SchemaError> {
        match self {
            ValidateError::Parse(ParseError::Malformed { errors }) => errors.iter().collect(),
            ValidateError::Parse(_) => Vec::new(),
            ValidateError::Invalid { errors, warnings } => {
                errors.iter().chain(warnings.iter()).collect()
            }
        }
    }
}

/// Errors while checking a payload against a method.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("unknown method: {name}")]
    UnknownMethod { name: String },

    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error("payload failed with {} violation(s)", violations.len())]
    Invalid { violations: Vec<Violation> },
}

/// Single payload violation with path context.
#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    /// JSON Pointer (RFC 6901) to the invalid value.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_display() {
        let err = SchemaError::UnresolvedReference {
            path: "methods.sample_method.request.foo".into(),
            name: "Unknown".into(),
        };
        assert_eq!(
            err.to_string(),
            "methods.sample_method.request.foo: 'Unknown' is not a primitive, enum or object"
        );
        assert_eq!(err.code(), "E004");
        assert_eq!(err.severity(), Severity::Error);
    }

    #[test]
    fn cycle_display() {
        let err = SchemaError::UnrepresentableCycle {
            path: "objects.Node.next".into(),
            chain: vec!["Node".into(), "Node".into()],
        };
        assert_eq!(
            err.to_string(),
            "objects.Node.next: unrepresentable cycle Node -> Node"
        );
    }

    #[test]
    fn advisory_errors_are_warnings() {
        let err = SchemaError::NoMethods {
            path: "methods".into(),
        };
        assert!(err.is_advisory());
        assert_eq!(err.severity(), Severity::Warning);
        assert_eq!(err.code(), "W005");
    }

    #[test]
    fn schema_error_serializes_with_kind() {
        let err = SchemaError::DuplicateDeclaration {
            path: "objects.Child".into(),
            name: "Child".into(),
            existing: DeclKind::Enum,
        };
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["kind"], "duplicate_declaration");
        assert_eq!(value["existing"], "enum");
        assert_eq!(value["path"], "objects.Child");
    }

    #[test]
    fn validate_error_counts() {
        let err = ValidateError::Invalid {
            errors: vec![SchemaError::EmptyEnumValue {
                path: "enums.TypeEnum.FIRST".into(),
            }],
            warnings: vec![],
        };
        assert_eq!(err.to_string(), "validation failed with 1 error(s)");
        assert_eq!(err.schema_errors().len(), 1);
    }

    #[test]
    fn violation_display() {
        let v = Violation {
            path: "/children/0/name".into(),
            message: "123 is not of type \"string\"".into(),
        };
        assert_eq!(v.to_string(), "/children/0/name: 123 is not of type \"string\"");
    }
}
