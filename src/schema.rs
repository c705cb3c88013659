//! Validated schema and its resolved type trees.
//!
//! A [`ValidatedSchema`] can only be produced by validation. Every reference
//! in it has been replaced by an [`EnumId`] or [`ObjectId`] that indexes the
//! schema's declaration arena.

use indexmap::IndexMap;
use serde_json::Value;

use crate::document::SchemaDocument;
use crate::error::SchemaError;
use crate::table::{DeclId, DeclarationTable, EnumId, ObjectId};
use crate::types::{Direction, EnumDecl, Primitive, TypeExpr};

/// A type expression with references resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedType {
    Primitive(Primitive),
    Enum(EnumId),
    Object(ObjectId),
    Nullable(Box<ResolvedType>),
    Union(Vec<ResolvedType>),
    Array(Box<ResolvedType>),
    InlineObject(Vec<ResolvedField>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    pub name: String,
    pub ty: ResolvedType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedObject {
    pub name: String,
    pub fields: Vec<ResolvedField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMethod {
    pub name: String,
    pub request: Vec<ResolvedField>,
    pub response: Vec<ResolvedField>,
}

impl ResolvedObject {
    pub fn field(&self, name: &str) -> Option<&ResolvedField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl ResolvedMethod {
    /// Fields for the given direction.
    pub fn fields(&self, direction: Direction) -> &[ResolvedField] {
        match direction {
            Direction::Request => &self.request,
            Direction::Response => &self.response,
        }
    }

    pub fn field(&self, direction: Direction, name: &str) -> Option<&ResolvedField> {
        self.fields(direction).iter().find(|f| f.name == name)
    }
}

/// A declaration looked up by name.
#[derive(Debug, Clone, Copy)]
pub enum Declaration<'a> {
    Enum(&'a EnumDecl),
    Object(&'a ResolvedObject),
}

impl Declaration<'_> {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Enum(decl) => &decl.name,
            Declaration::Object(decl) => &decl.name,
        }
    }
}

/// A schema document that passed validation.
///
/// Immutable; consumers read declarations through accessors.
#[derive(Debug, Clone)]
pub struct ValidatedSchema {
    document: SchemaDocument,
    table: DeclarationTable,
    objects: Vec<ResolvedObject>,
    methods: IndexMap<String, ResolvedMethod>,
    warnings: Vec<SchemaError>,
}

impl ValidatedSchema {
    pub(crate) fn new(
        document: SchemaDocument,
        table: DeclarationTable,
        objects: Vec<ResolvedObject>,
        methods: Vec<ResolvedMethod>,
        warnings: Vec<SchemaError>,
    ) -> Self {
        let methods = methods
            .into_iter()
            .map(|method| (method.name.clone(), method))
            .collect();
        Self {
            document,
            table,
            objects,
            methods,
            warnings,
        }
    }

    /// The document this schema was validated from.
    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }

    /// Advisory findings that did not fail validation.
    pub fn warnings(&self) -> &[SchemaError] {
        &self.warnings
    }

    pub fn enums(&self) -> impl Iterator<Item = (EnumId, &EnumDecl)> {
        self.document
            .enums
            .iter()
            .enumerate()
            .map(|(i, decl)| (EnumId(i), decl))
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &ResolvedObject)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, decl)| (ObjectId(i), decl))
    }

    pub fn methods(&self) -> impl Iterator<Item = &ResolvedMethod> {
        self.methods.values()
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn method(&self, name: &str) -> Option<&ResolvedMethod> {
        self.methods.get(name)
    }

    /// Enum behind a resolved id.
    pub fn enum_decl(&self, id: EnumId) -> &EnumDecl {
        &self.document.enums[id.0]
    }

    /// Object behind a resolved id.
    pub fn object(&self, id: ObjectId) -> &ResolvedObject {
        &self.objects[id.0]
    }

    /// Source type expression of an object field, before resolution.
    pub fn source_type(&self, id: ObjectId, field: &str) -> Option<&TypeExpr> {
        self.document.objects[id.0]
            .fields
            .iter()
            .find(|f| f.name == field)
            .map(|f| &f.ty)
    }

    /// Look up an enum or object by name.
    pub fn lookup(&self, name: &str) -> Option<Declaration<'_>> {
        match self.table.lookup(name).ok()? {
            DeclId::Enum(id) => Some(Declaration::Enum(self.enum_decl(id))),
            DeclId::Object(id) => Some(Declaration::Object(self.object(id))),
        }
    }

    pub fn enum_by_name(&self, name: &str) -> Option<&EnumDecl> {
        match self.lookup(name)? {
            Declaration::Enum(decl) => Some(decl),
            Declaration::Object(_) => None,
        }
    }

    pub fn object_by_name(&self, name: &str) -> Option<&ResolvedObject> {
        match self.lookup(name)? {
            Declaration::Object(decl) => Some(decl),
            Declaration::Enum(_) => None,
        }
    }

    pub fn table(&self) -> &DeclarationTable {
        &self.table
    }

    /// Canonical JSON form of the schema.
    pub fn to_value(&self) -> Value {
        self.document.to_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValidateOptions;
    use serde_json::json;

    fn schema() -> ValidatedSchema {
        SchemaDocument::parse_value(&json!({
            "enums": {"Color": {"RED": "red"}},
            "objects": {
                "Node": {"color": "Color", "next": ["Node", "null"]},
                "Leaf": {"size": "integer"}
            },
            "methods": {"paint": {"request": {"node": "Node"}, "response": {}}}
        }))
        .unwrap()
        .validate(&ValidateOptions::new())
        .unwrap()
    }

    #[test]
    fn ids_index_declarations() {
        let schema = schema();
        let ids: Vec<usize> = schema.objects().map(|(id, _)| id.index()).collect();
        assert_eq!(ids, vec![0, 1]);

        let node = schema.object_by_name("Node").unwrap();
        let ResolvedType::Enum(color) = node.field("color").unwrap().ty else {
            panic!("expected enum");
        };
        assert_eq!(schema.enum_decl(color).name, "Color");
    }

    #[test]
    fn nullable_self_reference_points_back() {
        let schema = schema();
        let (id, node) = schema.objects().next().unwrap();
        assert_eq!(
            node.field("next").unwrap().ty,
            ResolvedType::Nullable(Box::new(ResolvedType::Object(id)))
        );
    }

    #[test]
    fn source_type_keeps_spelling_normalized() {
        let schema = schema();
        let (leaf, _) = schema.objects().nth(1).unwrap();
        assert_eq!(
            schema.source_type(leaf, "size"),
            Some(&TypeExpr::Primitive(Primitive::Integer))
        );
        assert_eq!(schema.source_type(leaf, "missing"), None);
    }

    #[test]
    fn method_fields_by_direction() {
        let schema = schema();
        let method = schema.method("paint").unwrap();
        assert_eq!(method.fields(Direction::Request).len(), 1);
        assert!(method.fields(Direction::Response).is_empty());
        assert!(method.field(Direction::Response, "node").is_none());
        assert!(schema.method("draw").is_none());
    }

    #[test]
    fn lookup_kinds() {
        let schema = schema();
        assert!(matches!(schema.lookup("Color"), Some(Declaration::Enum(_))));
        assert!(matches!(schema.lookup("Leaf"), Some(Declaration::Object(_))));
        assert!(schema.lookup("paint").is_none());
        assert_eq!(schema.table().len(), 3);
    }
}
