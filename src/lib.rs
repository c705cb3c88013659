//! SmartRPC Annotation Schema
//!
//! Schema model and validator for SmartRPC annotations: JSON documents that
//! declare enums, objects and per-method request/response shapes.
//!
//! Work happens in two phases. Parsing turns JSON into a [`SchemaDocument`]
//! without looking at names. Validation resolves every reference, checks
//! names and cycles, and returns a [`ValidatedSchema`] or every error found.
//!
//! # Example
//!
//! ```
//! use smartrpc_schema::{ResolvedType, SchemaDocument, ValidateOptions, Direction, Primitive};
//! use serde_json::json;
//!
//! let document = SchemaDocument::parse_value(&json!({
//!     "enums": { "TypeEnum": { "FIRST": "first", "SECOND": "second" } },
//!     "objects": { "Child": { "name": "string" } },
//!     "methods": {
//!         "sample_method": {
//!             "request": {
//!                 "type": "TypeEnum",
//!                 "children": ["Child"],
//!                 "selected_days": [["date", "datetime"], "null"]
//!             },
//!             "response": { "ok": "boolean" }
//!         }
//!     }
//! })).unwrap();
//!
//! let schema = document.validate(&ValidateOptions::new()).unwrap();
//! let method = schema.method("sample_method").unwrap();
//! let days = method.field(Direction::Request, "selected_days").unwrap();
//!
//! assert_eq!(
//!     days.ty,
//!     ResolvedType::Nullable(Box::new(ResolvedType::Union(vec![
//!         ResolvedType::Primitive(Primitive::Date),
//!         ResolvedType::Primitive(Primitive::DateTime),
//!     ])))
//! );
//! ```
//!
//! # Type Grammar
//!
//! | Annotation | Meaning |
//! |------------|---------|
//! | `"int"`, `"float"`, `"boolean"`, `"string"`, `"uuid"`, `"date"`, `"datetime"` | primitive |
//! | `"TypeEnum"` | reference to a declared enum or object |
//! | `["Child"]` | array of `Child` |
//! | `["date", "null"]` | nullable `date` |
//! | `["int", "string"]` | union |
//! | `{ "monday": "string" }` | inline object |

mod document;
mod error;
mod linter;
mod loader;
mod parser;
mod payload;
mod raw;
mod schema;
mod table;
mod types;
mod validator;

pub use document::SchemaDocument;
pub use error::{ParseError, PayloadError, SchemaError, Severity, ValidateError, Violation};
pub use linter::{lint, lint_file, Diagnostic, FileResult, FileStatus, LintResult};
pub use loader::{load_document, load_schema, load_schema_str};
pub use parser::{parse_type, ROOT_PATH};
pub use schema::{
    Declaration, ResolvedField, ResolvedMethod, ResolvedObject, ResolvedType, ValidatedSchema,
};
pub use table::{AlreadyDeclared, DeclId, DeclarationTable, EnumId, ObjectId, Undeclared};
pub use types::{
    json_type_name, DeclKind, Direction, EnumDecl, EnumMember, Field, MethodDecl, ObjectDecl,
    PayloadOptions, Primitive, Strictness, TypeExpr, ValidateOptions, NULL_MARKER,
};
pub use validator::validate;
