//! Schema validation.
//!
//! Walks every enum, object and method of a [`SchemaDocument`] and collects
//! all defects in one pass:
//! - repeated names (declarations, methods, fields, enum members)
//! - references that name no enum or object
//! - objects that contain themselves by value
//! - empty enum values and declarations named like primitives
//! - advisory checks, depending on [`Strictness`]

use std::collections::HashSet;

use crate::document::SchemaDocument;
use crate::error::{SchemaError, ValidateError};
use crate::schema::{ResolvedField, ResolvedMethod, ResolvedObject, ResolvedType, ValidatedSchema};
use crate::table::{DeclId, DeclarationTable, EnumId, ObjectId};
use crate::types::{
    DeclKind, EnumDecl, Field, MethodDecl, ObjectDecl, Primitive, Strictness, TypeExpr,
    ValidateOptions,
};

/// Validate a parsed document.
///
/// The document is only read. On success the returned schema owns a copy of
/// it together with the resolved type trees.
///
/// # Errors
///
/// Returns `ValidateError::Invalid` holding every error, and the warnings
/// found alongside them.
pub fn validate(
    document: &SchemaDocument,
    options: &ValidateOptions,
) -> Result<ValidatedSchema, ValidateError> {
    let mut findings = Vec::new();
    let table = build_table(document, &mut findings);

    for decl in &document.enums {
        check_enum(decl, &mut findings);
    }

    let objects: Option<Vec<ResolvedObject>> = document
        .objects
        .iter()
        .map(|decl| {
            let path = format!("objects.{}", decl.name);
            check_fields(&decl.fields, &path, &table, &mut findings).map(|fields| ResolvedObject {
                name: decl.name.clone(),
                fields,
            })
        })
        .collect::<Vec<_>>()
        .into_iter()
        .collect();

    check_method_names(document, &table, &mut findings);
    let methods: Option<Vec<ResolvedMethod>> = document
        .methods
        .iter()
        .map(|decl| check_method(decl, &table, &mut findings))
        .collect::<Vec<_>>()
        .into_iter()
        .collect();

    findings.extend(find_cycles(document, &table));

    let (errors, warnings) = classify(findings, options.strictness);
    tracing::debug!(
        errors = errors.len(),
        warnings = warnings.len(),
        strictness = ?options.strictness,
        "validated schema document"
    );

    match (objects, methods) {
        (Some(objects), Some(methods)) if errors.is_empty() => Ok(ValidatedSchema::new(
            document.clone(),
            table,
            objects,
            methods,
            warnings,
        )),
        _ => Err(ValidateError::Invalid { errors, warnings }),
    }
}

/// Split findings into errors and warnings for the strictness level.
fn classify(
    findings: Vec<SchemaError>,
    strictness: Strictness,
) -> (Vec<SchemaError>, Vec<SchemaError>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    for finding in findings {
        match (finding.is_advisory(), strictness) {
            (false, _) | (true, Strictness::Strict) => errors.push(finding),
            (true, Strictness::Standard) => warnings.push(finding),
            (true, Strictness::Lenient) => {}
        }
    }
    (errors, warnings)
}

/// Register enums, then objects, in the shared namespace.
fn build_table(document: &SchemaDocument, findings: &mut Vec<SchemaError>) -> DeclarationTable {
    let mut table = DeclarationTable::new();

    let enums = document
        .enums
        .iter()
        .enumerate()
        .map(|(i, decl)| (decl.name.as_str(), DeclKind::Enum, DeclId::Enum(EnumId(i))));
    let objects = document.objects.iter().enumerate().map(|(i, decl)| {
        (
            decl.name.as_str(),
            DeclKind::Object,
            DeclId::Object(ObjectId(i)),
        )
    });

    for (name, kind, id) in enums.chain(objects) {
        let path = format!("{}.{}", kind.section(), name);
        if let Err(err) = table.insert(name, id) {
            findings.push(SchemaError::DuplicateDeclaration {
                path,
                name: name.to_string(),
                existing: err.existing.kind(),
            });
        } else {
            check_type_name(name, &path, findings);
        }
    }

    table
}

fn check_enum(decl: &EnumDecl, findings: &mut Vec<SchemaError>) {
    let mut seen_names = HashSet::new();
    let mut seen_values: Vec<(&str, &str)> = Vec::new();

    for member in &decl.members {
        let path = format!("enums.{}.{}", decl.name, member.name);
        if !seen_names.insert(member.name.as_str()) {
            findings.push(SchemaError::DuplicateKey {
                path,
                key: member.name.clone(),
            });
            continue;
        }
        if member.value.is_empty() {
            findings.push(SchemaError::EmptyEnumValue { path });
            continue;
        }
        match seen_values.iter().find(|(value, _)| *value == member.value) {
            Some((_, first)) => findings.push(SchemaError::DuplicateEnumValue {
                path,
                value: member.value.clone(),
                first: first.to_string(),
            }),
            None => seen_values.push((&member.value, &member.name)),
        }
    }
}

fn check_method_names(
    document: &SchemaDocument,
    table: &DeclarationTable,
    findings: &mut Vec<SchemaError>,
) {
    if document.methods.is_empty() {
        findings.push(SchemaError::NoMethods {
            path: "methods".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for decl in &document.methods {
        let path = format!("methods.{}", decl.name);
        if !seen.insert(decl.name.as_str()) {
            findings.push(SchemaError::DuplicateDeclaration {
                path,
                name: decl.name.clone(),
                existing: DeclKind::Method,
            });
            continue;
        }
        if table.contains(&decl.name) {
            findings.push(SchemaError::NameCollision {
                path: path.clone(),
                name: decl.name.clone(),
            });
        }
        if !is_snake_case(&decl.name) {
            findings.push(SchemaError::NamingConvention {
                path,
                name: decl.name.clone(),
                expected: "lowercase snake_case",
            });
        }
    }
}

fn check_method(
    decl: &MethodDecl,
    table: &DeclarationTable,
    findings: &mut Vec<SchemaError>,
) -> Option<ResolvedMethod> {
    let base = format!("methods.{}", decl.name);
    let request = check_fields(&decl.request, &format!("{}.request", base), table, findings);
    let response = check_fields(&decl.response, &format!("{}.response", base), table, findings);
    Some(ResolvedMethod {
        name: decl.name.clone(),
        request: request?,
        response: response?,
    })
}

/// Check a field list and resolve it. Keeps going after failures.
fn check_fields(
    fields: &[Field],
    path: &str,
    table: &DeclarationTable,
    findings: &mut Vec<SchemaError>,
) -> Option<Vec<ResolvedField>> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(fields.len());
    let mut complete = true;

    for field in fields {
        let field_path = format!("{}.{}", path, field.name);
        if !seen.insert(field.name.as_str()) {
            findings.push(SchemaError::DuplicateKey {
                path: field_path.clone(),
                key: field.name.clone(),
            });
        }
        if Primitive::is_reserved(&field.name) {
            findings.push(SchemaError::ShadowsPrimitive {
                path: field_path.clone(),
                name: field.name.clone(),
            });
        }
        match resolve_type(&field.ty, &field_path, table, findings) {
            Some(ty) => resolved.push(ResolvedField {
                name: field.name.clone(),
                ty,
            }),
            None => complete = false,
        }
    }

    complete.then_some(resolved)
}

fn resolve_type(
    ty: &TypeExpr,
    path: &str,
    table: &DeclarationTable,
    findings: &mut Vec<SchemaError>,
) -> Option<ResolvedType> {
    match ty {
        TypeExpr::Primitive(p) => Some(ResolvedType::Primitive(*p)),
        TypeExpr::Reference(name) => match table.lookup(name) {
            Ok(DeclId::Enum(id)) => Some(ResolvedType::Enum(id)),
            Ok(DeclId::Object(id)) => Some(ResolvedType::Object(id)),
            Err(_) => {
                findings.push(SchemaError::UnresolvedReference {
                    path: path.to_string(),
                    name: name.clone(),
                });
                None
            }
        },
        TypeExpr::Nullable(inner) => resolve_type(inner, path, table, findings)
            .map(|inner| ResolvedType::Nullable(Box::new(inner))),
        TypeExpr::Array(element) => {
            resolve_type(element, &format!("{}[]", path), table, findings)
                .map(|element| ResolvedType::Array(Box::new(element)))
        }
        TypeExpr::Union(alternatives) => alternatives
            .iter()
            .map(|alternative| resolve_type(alternative, path, table, findings))
            .collect::<Vec<_>>()
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .map(ResolvedType::Union),
        TypeExpr::InlineObject(fields) => {
            check_fields(fields, path, table, findings).map(ResolvedType::InlineObject)
        }
    }
}

/// A by-value use of one object inside another.
struct Edge {
    target: usize,
    path: String,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Active,
    Done,
}

/// Report objects that contain themselves without an array or nullable
/// in between. Unions and inline objects hold their members by value.
///
/// Depth-first walk with an explicit stack of `(object, next edge)` frames,
/// so long chains of objects don't grow the call stack.
fn find_cycles(document: &SchemaDocument, table: &DeclarationTable) -> Vec<SchemaError> {
    let edges: Vec<Vec<Edge>> = document
        .objects
        .iter()
        .map(|decl| by_value_edges(decl, table))
        .collect();

    let mut marks = vec![Mark::Unvisited; edges.len()];
    let mut findings = Vec::new();

    for start in 0..edges.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        marks[start] = Mark::Active;
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let Some(edge) = edges[node].get(frame.1) else {
                marks[node] = Mark::Done;
                stack.pop();
                continue;
            };
            frame.1 += 1;

            match marks[edge.target] {
                Mark::Unvisited => {
                    marks[edge.target] = Mark::Active;
                    stack.push((edge.target, 0));
                }
                Mark::Active => {
                    let first = stack
                        .iter()
                        .position(|&(n, _)| n == edge.target)
                        .unwrap_or_default();
                    let chain = stack[first..]
                        .iter()
                        .map(|&(n, _)| n)
                        .chain(std::iter::once(edge.target))
                        .map(|i| document.objects[i].name.clone())
                        .collect();
                    findings.push(SchemaError::UnrepresentableCycle {
                        path: edge.path.clone(),
                        chain,
                    });
                }
                Mark::Done => {}
            }
        }
    }

    findings
}

fn by_value_edges(decl: &ObjectDecl, table: &DeclarationTable) -> Vec<Edge> {
    let mut edges = Vec::new();
    let path = format!("objects.{}", decl.name);
    collect_field_edges(&decl.fields, &path, table, &mut edges);
    edges
}

fn collect_field_edges(
    fields: &[Field],
    path: &str,
    table: &DeclarationTable,
    edges: &mut Vec<Edge>,
) {
    for field in fields {
        collect_edges(&field.ty, &format!("{}.{}", path, field.name), table, edges);
    }
}

fn collect_edges(ty: &TypeExpr, path: &str, table: &DeclarationTable, edges: &mut Vec<Edge>) {
    match ty {
        TypeExpr::Reference(name) => {
            if let Ok(DeclId::Object(id)) = table.lookup(name) {
                edges.push(Edge {
                    target: id.0,
                    path: path.to_string(),
                });
            }
        }
        TypeExpr::Union(alternatives) => {
            for alternative in alternatives {
                collect_edges(alternative, path, table, edges);
            }
        }
        TypeExpr::InlineObject(fields) => collect_field_edges(fields, path, table, edges),
        // Arrays and nullables can be empty, which ends the recursion
        TypeExpr::Primitive(_) | TypeExpr::Nullable(_) | TypeExpr::Array(_) => {}
    }
}

/// Reserved spellings always parse as primitives, so such a declaration
/// could never be referenced.
fn check_type_name(name: &str, path: &str, findings: &mut Vec<SchemaError>) {
    if Primitive::is_reserved(name) {
        findings.push(SchemaError::ReservedName {
            path: path.to_string(),
            name: name.to_string(),
        });
    } else if !is_camel_case(name) {
        findings.push(SchemaError::NamingConvention {
            path: path.to_string(),
            name: name.to_string(),
            expected: "CamelCase",
        });
    }
}

fn is_camel_case(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphanumeric())
}

fn is_snake_case(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
