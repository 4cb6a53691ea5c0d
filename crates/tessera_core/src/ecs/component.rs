//! # Component Registry
//!
//! Component types are plain Rust types. The registry gives each one a small
//! sequential [`ComponentId`] so the entity manager can keep its per-type
//! storage in a flat table instead of a hash map.
//!
//! The registry is built once at startup and handed to the manager, which
//! never registers anything on its own.

use std::any::{type_name, TypeId};
use std::collections::HashMap;

use crate::error::{EcsError, EcsResult};

/// Marker trait for component types.
///
/// Blanket-implemented for every `'static` type; nothing needs to opt in.
pub trait Component: 'static {}

impl<T: 'static> Component for T {}

/// Default limit on registered component types.
pub const DEFAULT_MAX_COMPONENT_TYPES: usize = 1024;

/// Sequential identifier of a registered component type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u32);

impl ComponentId {
    /// Position in registration order, starting at zero.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Maps component types to [`ComponentId`]s.
///
/// # Example
///
/// ```rust,ignore
/// let mut registry = ComponentRegistry::new();
/// let position = registry.register::<Position>()?;
/// assert_eq!(registry.register::<Position>()?, position);
/// ```
#[derive(Debug, Clone)]
pub struct ComponentRegistry {
    by_type: HashMap<TypeId, ComponentId>,
    names: Vec<&'static str>,
    max: usize,
}

impl ComponentRegistry {
    /// Empty registry with the default limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_COMPONENT_TYPES)
    }

    /// Empty registry accepting at most `max` component types.
    #[must_use]
    pub fn with_limit(max: usize) -> Self {
        Self {
            by_type: HashMap::new(),
            names: Vec::new(),
            max,
        }
    }

    /// Registers `C` and returns its id. Registering twice returns the
    /// existing id.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::TooManyComponentTypes`] if the registry is full.
    pub fn register<C: Component>(&mut self) -> EcsResult<ComponentId> {
        let type_id = TypeId::of::<C>();
        if let Some(&existing) = self.by_type.get(&type_id) {
            return Ok(existing);
        }
        if self.names.len() >= self.max {
            return Err(EcsError::TooManyComponentTypes { max: self.max });
        }

        let id = ComponentId(self.names.len() as u32);
        self.by_type.insert(type_id, id);
        self.names.push(type_name::<C>());
        tracing::debug!("registered component `{}` as {:?}", type_name::<C>(), id);
        Ok(id)
    }

    /// Id of `C`, if registered.
    #[inline]
    #[must_use]
    pub fn id_of<C: Component>(&self) -> Option<ComponentId> {
        self.by_type.get(&TypeId::of::<C>()).copied()
    }

    /// Id of `C`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnregisteredComponent`] if `C` was never
    /// registered.
    #[inline]
    pub fn lookup<C: Component>(&self) -> EcsResult<ComponentId> {
        self.id_of::<C>()
            .ok_or(EcsError::UnregisteredComponent(type_name::<C>()))
    }

    /// Type name recorded for `id`.
    #[must_use]
    pub fn name(&self, id: ComponentId) -> Option<&'static str> {
        self.names.get(id.index()).copied()
    }

    /// Number of registered types.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if nothing is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Maximum number of component types.
    #[inline]
    #[must_use]
    pub const fn max(&self) -> usize {
        self.max
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Position;
    struct Velocity;

    #[test]
    fn test_ids_are_sequential() {
        let mut registry = ComponentRegistry::new();
        let position = registry.register::<Position>().unwrap();
        let velocity = registry.register::<Velocity>().unwrap();
        assert_eq!(position.index(), 0);
        assert_eq!(velocity.index(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = ComponentRegistry::new();
        let first = registry.register::<Position>().unwrap();
        assert_eq!(registry.register::<Position>(), Ok(first));
        assert_eq!(registry.len(), 1);
        assert!(registry.name(first).unwrap().ends_with("Position"));
    }

    #[test]
    fn test_limit_enforced() {
        let mut registry = ComponentRegistry::with_limit(1);
        registry.register::<Position>().unwrap();
        assert_eq!(
            registry.register::<Velocity>(),
            Err(EcsError::TooManyComponentTypes { max: 1 })
        );
        // Already-registered types still resolve.
        assert!(registry.register::<Position>().is_ok());
    }

    #[test]
    fn test_lookup_unregistered() {
        let registry = ComponentRegistry::new();
        assert!(registry.id_of::<u32>().is_none());
        assert_eq!(
            registry.lookup::<u32>(),
            Err(EcsError::UnregisteredComponent("u32"))
        );
    }
}
