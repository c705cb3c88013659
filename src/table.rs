//! Declaration table: one namespace shared by enums and objects.

use indexmap::IndexMap;
use thiserror::Error;

use crate::types::DeclKind;

/// Index of an enum in its schema's declaration arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnumId(pub(crate) usize);

/// Index of an object in its schema's declaration arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) usize);

impl EnumId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl ObjectId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// What a declared name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclId {
    Enum(EnumId),
    Object(ObjectId),
}

impl DeclId {
    pub fn kind(&self) -> DeclKind {
        match self {
            DeclId::Enum(_) => DeclKind::Enum,
            DeclId::Object(_) => DeclKind::Object,
        }
    }
}

/// Returned by [`DeclarationTable::insert`] when the name is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("name already declared as {}", existing.kind())]
pub struct AlreadyDeclared {
    pub existing: DeclId,
}

/// Returned by [`DeclarationTable::lookup`] for unknown names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("undeclared name: {name}")]
pub struct Undeclared {
    pub name: String,
}

/// Name to declaration index, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct DeclarationTable {
    entries: IndexMap<String, DeclId>,
}

impl DeclarationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a name. The first declaration of a name wins.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyDeclared` if the name is taken by an enum or object.
    pub fn insert(&mut self, name: &str, id: DeclId) -> Result<(), AlreadyDeclared> {
        if let Some(&existing) = self.entries.get(name) {
            return Err(AlreadyDeclared { existing });
        }
        self.entries.insert(name.to_string(), id);
        Ok(())
    }

    /// Resolve a name.
    ///
    /// # Errors
    ///
    /// Returns `Undeclared` if no enum or object has this name.
    pub fn lookup(&self, name: &str) -> Result<DeclId, Undeclared> {
        self.entries.get(name).copied().ok_or_else(|| Undeclared {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names and targets in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, DeclId)> {
        self.entries.iter().map(|(name, id)| (name.as_str(), *id))
    }
}
