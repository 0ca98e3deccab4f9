use std::collections::BTreeMap;

use mechworks_common::TypeId;
use serde::{Deserialize, Serialize};

/// Static capabilities of a registered cell type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeProperties {
    pub name: String,
    /// May be overwritten in place instead of being relocated (vegetation, air).
    pub replaceable: bool,
    /// Can never be moved by a mechanism (bedrock, obsidian).
    pub pinned: bool,
    pub solid: bool,
}

impl TypeProperties {
    /// An ordinary movable, solid type.
    pub fn solid(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replaceable: false,
            pinned: false,
            solid: true,
        }
    }

    /// A solid type that mechanisms cannot move.
    pub fn pinned(name: impl Into<String>) -> Self {
        Self {
            pinned: true,
            ..Self::solid(name)
        }
    }

    /// A non-solid type that is destroyed when something is pushed into it.
    pub fn replaceable(name: impl Into<String>) -> Self {
        Self {
            replaceable: true,
            solid: false,
            ..Self::solid(name)
        }
    }
}

/// Errors from type registration.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("cell type {0:?} is already registered")]
    DuplicateName(String),
    #[error("type id space exhausted")]
    Exhausted,
}

/// Registry of cell types keyed by stable `TypeId`.
///
/// Built once at startup and then shared read-only (usually behind an `Arc`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeRegistry {
    types: BTreeMap<TypeId, TypeProperties>,
    by_name: BTreeMap<String, TypeId>,
}

impl TypeRegistry {
    /// A registry containing only the empty type ("air") at `TypeId::EMPTY`.
    pub fn new() -> Self {
        let air = TypeProperties::replaceable("air");
        let mut by_name = BTreeMap::new();
        by_name.insert(air.name.clone(), TypeId::EMPTY);
        let mut types = BTreeMap::new();
        types.insert(TypeId::EMPTY, air);
        Self { types, by_name }
    }

    /// Register a new type and return its id.
    pub fn register(&mut self, props: TypeProperties) -> Result<TypeId, RegistryError> {
        if self.by_name.contains_key(&props.name) {
            return Err(RegistryError::DuplicateName(props.name));
        }
        let next = self
            .types
            .keys()
            .next_back()
            .map_or(Some(0), |id| id.0.checked_add(1))
            .ok_or(RegistryError::Exhausted)?;
        let id = TypeId(next);
        tracing::debug!(?id, name = %props.name, "registered cell type");
        self.by_name.insert(props.name.clone(), id);
        self.types.insert(id, props);
        Ok(id)
    }

    pub fn get(&self, id: TypeId) -> Option<&TypeProperties> {
        self.types.get(&id)
    }

    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, id: TypeId) -> Option<&str> {
        self.get(id).map(|p| p.name.as_str())
    }

    pub fn is_replaceable(&self, id: TypeId) -> bool {
        self.get(id).is_some_and(|p| p.replaceable)
    }

    /// Number of registered types, including air.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &TypeProperties)> {
        self.types.iter().map(|(id, p)| (*id, p))
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
