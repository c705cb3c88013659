//! Core types for SmartRPC annotation schemas.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// The string that marks a union as nullable, e.g. `["date", "null"]`.
pub const NULL_MARKER: &str = "null";

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Built-in scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Integer,
    Float,
    Boolean,
    String,
    Uuid,
    Date,
    DateTime,
}

impl Primitive {
    pub const ALL: [Primitive; 7] = [
        Primitive::Integer,
        Primitive::Float,
        Primitive::Boolean,
        Primitive::String,
        Primitive::Uuid,
        Primitive::Date,
        Primitive::DateTime,
    ];

    /// Parse a primitive from its annotation spelling.
    ///
    /// `int` is the canonical spelling of [`Primitive::Integer`]; `integer` is
    /// accepted as an alias. Returns `None` for anything else, which the parser
    /// then treats as a reference to a declared enum or object.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "int" | "integer" => Some(Primitive::Integer),
            "float" => Some(Primitive::Float),
            "boolean" => Some(Primitive::Boolean),
            "string" => Some(Primitive::String),
            "uuid" => Some(Primitive::Uuid),
            "date" => Some(Primitive::Date),
            "datetime" => Some(Primitive::DateTime),
            _ => None,
        }
    }

    /// Canonical annotation spelling.
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Integer => "int",
            Primitive::Float => "float",
            Primitive::Boolean => "boolean",
            Primitive::String => "string",
            Primitive::Uuid => "uuid",
            Primitive::Date => "date",
            Primitive::DateTime => "datetime",
        }
    }

    /// True if `name` is spelled like a primitive or the null marker.
    pub fn is_reserved(name: &str) -> bool {
        name == NULL_MARKER || Self::parse(name).is_some()
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A type expression found in a field position.
///
/// Parsed values are kept in normal form: a `Union` never holds a `Union` or
/// a `Nullable`, and a `Nullable` never holds another `Nullable`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Primitive(Primitive),
    /// Name of a declared enum or object, resolved during validation.
    Reference(String),
    Nullable(Box<TypeExpr>),
    /// At least two distinct alternatives.
    Union(Vec<TypeExpr>),
    Array(Box<TypeExpr>),
    /// Anonymous object, fields in declaration order.
    InlineObject(Vec<Field>),
}

impl TypeExpr {
    /// Canonical JSON form of this expression.
    ///
    /// Nullable is emitted as a two-element array ending in `"null"`, arrays
    /// as one-element arrays and unions as arrays of their alternatives.
    pub fn to_value(&self) -> Value {
        match self {
            TypeExpr::Primitive(p) => Value::String(p.name().to_string()),
            TypeExpr::Reference(name) => Value::String(name.clone()),
            TypeExpr::Nullable(inner) => Value::Array(vec![
                inner.to_value(),
                Value::String(NULL_MARKER.to_string()),
            ]),
            TypeExpr::Union(alternatives) => {
                Value::Array(alternatives.iter().map(TypeExpr::to_value).collect())
            }
            TypeExpr::Array(element) => Value::Array(vec![element.to_value()]),
            TypeExpr::InlineObject(fields) => fields_to_value(fields),
        }
    }

    /// Walk every reference name in this expression.
    pub fn references(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_references(&mut names);
        names
    }

    fn collect_references<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            TypeExpr::Primitive(_) => {}
            TypeExpr::Reference(name) => names.push(name),
            TypeExpr::Nullable(inner) | TypeExpr::Array(inner) => inner.collect_references(names),
            TypeExpr::Union(alternatives) => {
                for alternative in alternatives {
                    alternative.collect_references(names);
                }
            }
            TypeExpr::InlineObject(fields) => {
                for field in fields {
                    field.ty.collect_references(names);
                }
            }
        }
    }
}

impl Serialize for TypeExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

/// A named field of an object, inline object, request or response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: TypeExpr,
}

pub(crate) fn fields_to_value(fields: &[Field]) -> Value {
    let map: Map<String, Value> = fields
        .iter()
        .map(|field| (field.name.clone(), field.ty.to_value()))
        .collect();
    Value::Object(map)
}

/// A single enum member: name and literal string value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDecl {
    pub name: String,
    pub members: Vec<EnumMember>,
}

impl EnumDecl {
    /// Member values in declaration order, duplicates removed.
    pub fn values(&self) -> Vec<&str> {
        let mut values: Vec<&str> = Vec::with_capacity(self.members.len());
        for member in &self.members {
            if !values.contains(&member.value.as_str()) {
                values.push(&member.value);
            }
        }
        values
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDecl {
    pub name: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub name: String,
    pub request: Vec<Field>,
    pub response: Vec<Field>,
}

impl MethodDecl {
    /// Fields for the given direction.
    pub fn fields(&self, direction: Direction) -> &[Field] {
        match direction {
            Direction::Request => &self.request,
            Direction::Response => &self.response,
        }
    }
}

/// Kind of a top-level declaration, used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    Enum,
    Object,
    Method,
}

impl DeclKind {
    /// Section of the document holding declarations of this kind.
    pub fn section(&self) -> &'static str {
        match self {
            DeclKind::Enum => "enums",
            DeclKind::Object => "objects",
            DeclKind::Method => "methods",
        }
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeclKind::Enum => "enum",
            DeclKind::Object => "object",
            DeclKind::Method => "method",
        })
    }
}

/// Side of a method call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Request,
    Response,
}

impl Direction {
    /// Key of this direction inside a method declaration.
    pub fn key(&self) -> &'static str {
        match self {
            Direction::Request => "request",
            Direction::Response => "response",
        }
    }
}

/// How advisory checks are treated during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strictness {
    /// Advisory checks are skipped.
    Lenient,
    /// Advisory findings are reported as warnings.
    #[default]
    Standard,
    /// Advisory findings fail validation.
    Strict,
}

impl Strictness {
    /// Parse a strictness level from a string.
    ///
    /// Returns `None` for unknown values (caller should error).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "lenient" => Some(Strictness::Lenient),
            "standard" => Some(Strictness::Standard),
            "strict" => Some(Strictness::Strict),
            _ => None,
        }
    }
}

/// Options for schema validation.
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    pub strictness: Strictness,
}

impl ValidateOptions {
    /// Create options with [`Strictness::Standard`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the strictness level.
    pub fn strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }
}

/// Options for exporting and checking method payloads.
#[derive(Debug, Clone)]
pub struct PayloadOptions {
    /// Whether the payload is a request or a response.
    pub direction: Direction,
    /// When true, sets `additionalProperties: false` on every object so that
    /// unknown fields are rejected. Defaults to false.
    pub strict: bool,
}

impl PayloadOptions {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            strict: false,
        }
    }

    /// Set strict mode (additionalProperties: false on all objects).
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}
