//! # Entity Manager
//!
//! Owns the entity table and one component storage per registered type.
//! Both draw chunks from the same allocator: entity records under
//! `EcsEntities`, component values under `EcsComponentMap`.
//!
//! ```text
//! entities: ChunkSlotMap<EntityRecord>        storages: [StorageSlot; N]
//!   Entity(3v0) ─► record { (id 0, key a),       [0] ChunkSlotMap<Position>  ◄── key a
//!                           (id 2, key b) }      [1] None (never assigned)
//!                                                [2] ChunkSlotMap<Health>    ◄── key b
//! ```
//!
//! The record is the only link between an entity and its components, so
//! releasing an entity walks the record and erases every component it owns.

use std::any::type_name;

use super::component::{Component, ComponentId, ComponentRegistry};
use super::entity::Entity;
use super::storage::{typed, typed_mut, StorageSlot};
use crate::config::StorageConfig;
use crate::error::{ConfigError, EcsError, EcsResult, SlotMapError};
use crate::memory::{ChunkAllocator, MemoryTag, SystemAllocator, DEFAULT_ELEMENTS_PER_CHUNK};
use crate::slot::{ChunkSlotMap, SlotKey};

/// Per-entity bookkeeping: which components it owns and where.
#[derive(Debug, Default, Clone)]
struct EntityRecord {
    components: Vec<(ComponentId, SlotKey)>,
}

impl EntityRecord {
    #[inline]
    fn find(&self, id: ComponentId) -> Option<SlotKey> {
        self.components
            .iter()
            .find_map(|&(owned, key)| (owned == id).then_some(key))
    }
}

/// Allocates entities and stores their components.
///
/// Entity handles come from a [`ChunkSlotMap`], so a handle stays valid
/// until its entity is released and becomes stale (never aliased) after.
///
/// # Thread Safety
///
/// No internal synchronization. Serialize access externally.
///
/// # Example
///
/// ```rust,ignore
/// let mut registry = ComponentRegistry::new();
/// registry.register::<Health>()?;
///
/// let mut manager = EntityManager::new(registry);
/// let entity = manager.allocate();
/// manager.assign(entity, Health(100))?;
/// assert_eq!(manager.get::<Health>(entity)?.0, 100);
///
/// manager.release(entity);
/// assert!(!manager.is_alive(entity));
/// ```
pub struct EntityManager<A: ChunkAllocator = SystemAllocator> {
    entities: ChunkSlotMap<EntityRecord, A>,
    /// Indexed by `ComponentId`; one entry per registered type.
    storages: Vec<StorageSlot>,
    registry: ComponentRegistry,
    alloc: A,
    /// Chunk shift for component storages.
    component_shift: u32,
    component_capacity: usize,
}

impl<A: ChunkAllocator + Default> EntityManager<A> {
    /// Creates a manager with default sizing.
    #[must_use]
    pub fn new(registry: ComponentRegistry) -> Self {
        let storages = Self::empty_storages(&registry);
        let component_capacity = StorageConfig::default().component_capacity;
        let alloc = A::default();
        Self {
            entities: ChunkSlotMap::with_shift(
                DEFAULT_ELEMENTS_PER_CHUNK.trailing_zeros(),
                alloc.clone(),
                MemoryTag::EcsEntities,
            ),
            storages,
            registry,
            alloc,
            component_shift: component_capacity.next_power_of_two().trailing_zeros(),
            component_capacity,
        }
    }

    /// Creates a manager sized by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if `config` fails
    /// [`StorageConfig::validate`] or `component_capacity` has no
    /// power-of-two chunk size, and [`EcsError::TooManyComponentTypes`] if
    /// `registry` holds more types than `config.max_component_types`.
    pub fn with_config(config: &StorageConfig, registry: ComponentRegistry) -> EcsResult<Self> {
        Self::with_allocator(config, registry, A::default())
    }
}

impl<A: ChunkAllocator> EntityManager<A> {
    /// Creates a manager sized by `config` whose entity table and component
    /// storages draw chunks from `alloc`.
    ///
    /// # Errors
    ///
    /// Same as [`with_config`](Self::with_config).
    pub fn with_allocator(
        config: &StorageConfig,
        registry: ComponentRegistry,
        alloc: A,
    ) -> EcsResult<Self> {
        config.validate().map_err(|err| match err {
            ConfigError::Invalid(reason) => EcsError::InvalidConfig(reason),
            other => EcsError::InvalidConfig(other.to_string()),
        })?;
        let component_shift = config
            .component_capacity
            .max(1)
            .checked_next_power_of_two()
            .map(usize::trailing_zeros)
            .ok_or_else(|| {
                EcsError::InvalidConfig(format!(
                    "component_capacity {} is too large",
                    config.component_capacity
                ))
            })?;
        if registry.len() > config.max_component_types {
            return Err(EcsError::TooManyComponentTypes {
                max: config.max_component_types,
            });
        }

        let entities = ChunkSlotMap::with_value_tag(
            config.entities_per_chunk,
            alloc.clone(),
            MemoryTag::EcsEntities,
        )
        .map_err(SlotMapError::from)?;

        tracing::debug!(
            "entity manager: {} entities per chunk, {} component types",
            config.entities_per_chunk,
            registry.len()
        );

        Ok(Self {
            entities,
            storages: Self::empty_storages(&registry),
            registry,
            alloc,
            component_shift,
            component_capacity: config.component_capacity,
        })
    }

    fn empty_storages(registry: &ComponentRegistry) -> Vec<StorageSlot> {
        std::iter::repeat_with(|| None).take(registry.len()).collect()
    }

    /// The registry this manager resolves component types through.
    #[inline]
    #[must_use]
    pub const fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Allocates a new entity with no components.
    ///
    /// # Panics
    ///
    /// Panics if the entity table cannot grow. Use
    /// [`try_allocate`](Self::try_allocate) to handle that.
    #[track_caller]
    pub fn allocate(&mut self) -> Entity {
        match self.try_allocate() {
            Ok(entity) => entity,
            Err(err) => panic!("entity allocation failed: {err}"),
        }
    }

    /// Allocates a new entity, reporting growth failure.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::SlotMap`] if the entity table cannot grow.
    pub fn try_allocate(&mut self) -> EcsResult<Entity> {
        let entity = Entity::from_key(self.entities.try_insert(EntityRecord::default())?);
        tracing::trace!("allocated {:?}", entity);
        Ok(entity)
    }

    /// Releases `entity` and every component it owns.
    ///
    /// Returns `false` if the entity was already released or never existed.
    pub fn release(&mut self, entity: Entity) -> bool {
        let Some(record) = self.entities.remove(entity.key()) else {
            return false;
        };
        for (id, key) in record.components {
            if let Some(storage) = self.storages.get_mut(id.index()).and_then(Option::as_mut) {
                storage.erase(key);
            }
        }
        tracing::trace!("released {:?}", entity);
        true
    }

    /// Releases every entity and component. All handles become stale.
    pub fn release_all(&mut self) {
        let released = self.entities.len();
        self.entities.clear();
        for storage in self.storages.iter_mut().flatten() {
            storage.clear();
        }
        tracing::debug!("released all {} entities", released);
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> u64 {
        self.entities.len() as u64
    }

    /// Returns `true` if `entity` has not been released.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.contains(entity.key())
    }

    /// Live entities, in entity-table dense order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.keys().map(Entity::from_key)
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Gives `entity` the component `value`, replacing any existing `C`.
    ///
    /// The type's storage is created on first use with
    /// `component_capacity` slots reserved, rounded up to whole chunks.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnregisteredComponent`] if `C` is not in the
    /// registry, [`EcsError::DeadEntity`] if `entity` was released, or
    /// [`EcsError::SlotMap`] if the storage cannot grow.
    pub fn assign<C: Component>(&mut self, entity: Entity, value: C) -> EcsResult<&mut C> {
        let id = self.registry.lookup::<C>()?;
        let record = self
            .entities
            .try_get_mut(entity.key())
            .ok_or_else(|| dead(entity))?;
        let storage = storage_mut::<C, A>(
            &mut self.storages,
            id,
            &self.alloc,
            self.component_shift,
            self.component_capacity,
        )?;

        let key = match record.find(id) {
            Some(key) => {
                *storage.get_mut(key)? = value;
                key
            }
            None => {
                let key = storage.try_insert(value)?;
                record.components.push((id, key));
                key
            }
        };
        Ok(storage.get_mut(key)?)
    }

    /// The `C` component of `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnregisteredComponent`], [`EcsError::DeadEntity`]
    /// or [`EcsError::MissingComponent`].
    pub fn get<C: Component>(&self, entity: Entity) -> EcsResult<&C> {
        let (id, key) = self.component_key::<C>(entity)?;
        let storage = self
            .storages
            .get(id.index())
            .and_then(typed::<C, A>)
            .ok_or_else(|| missing::<C>(entity))?;
        Ok(storage.get(key)?)
    }

    /// Mutable form of [`get`](Self::get).
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub fn get_mut<C: Component>(&mut self, entity: Entity) -> EcsResult<&mut C> {
        let (id, key) = self.component_key::<C>(entity)?;
        let storage = self
            .storages
            .get_mut(id.index())
            .and_then(typed_mut::<C, A>)
            .ok_or_else(|| missing::<C>(entity))?;
        Ok(storage.get_mut(key)?)
    }

    /// The `C` component of `entity`, or `None` for any reason it is absent.
    #[must_use]
    pub fn try_get<C: Component>(&self, entity: Entity) -> Option<&C> {
        self.get(entity).ok()
    }

    /// Mutable form of [`try_get`](Self::try_get).
    pub fn try_get_mut<C: Component>(&mut self, entity: Entity) -> Option<&mut C> {
        self.get_mut(entity).ok()
    }

    /// Returns `true` if `entity` is alive and has a `C`.
    #[must_use]
    pub fn contains<C: Component>(&self, entity: Entity) -> bool {
        self.try_get::<C>(entity).is_some()
    }

    /// Drops the `C` component of `entity`.
    ///
    /// Returns `false` if the entity is dead, has no `C`, or `C` is not
    /// registered.
    pub fn remove<C: Component>(&mut self, entity: Entity) -> bool {
        let Some(id) = self.registry.id_of::<C>() else {
            return false;
        };
        let Some(record) = self.entities.try_get_mut(entity.key()) else {
            return false;
        };
        let Some(position) = record.components.iter().position(|&(owned, _)| owned == id) else {
            return false;
        };

        let (_, key) = record.components.swap_remove(position);
        self.storages
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .is_some_and(|storage| storage.erase(key))
    }

    /// Every live `C`, in storage dense order.
    pub fn components<C: Component>(&self) -> impl Iterator<Item = &C> {
        self.storage::<C>()
            .into_iter()
            .flat_map(|storage| storage.iter())
    }

    /// Number of live `C` components.
    #[must_use]
    pub fn component_count<C: Component>(&self) -> usize {
        self.storage::<C>().map_or(0, ChunkSlotMap::len)
    }

    fn storage<C: Component>(&self) -> Option<&ChunkSlotMap<C, A>> {
        let id = self.registry.id_of::<C>()?;
        typed::<C, A>(self.storages.get(id.index())?)
    }

    /// Resolves `C` and finds where `entity` keeps it.
    fn component_key<C: Component>(&self, entity: Entity) -> EcsResult<(ComponentId, SlotKey)> {
        let id = self.registry.lookup::<C>()?;
        let record = self
            .entities
            .try_get(entity.key())
            .ok_or_else(|| dead(entity))?;
        let key = record.find(id).ok_or_else(|| missing::<C>(entity))?;
        Ok((id, key))
    }
}

impl<A: ChunkAllocator + Default> Default for EntityManager<A> {
    fn default() -> Self {
        Self::new(ComponentRegistry::default())
    }
}

/// Storage for `C`, created with `capacity` reserved slots on first use.
fn storage_mut<'a, C: Component, A: ChunkAllocator>(
    storages: &'a mut [StorageSlot],
    id: ComponentId,
    alloc: &A,
    shift: u32,
    capacity: usize,
) -> EcsResult<&'a mut ChunkSlotMap<C, A>> {
    let slot = storages
        .get_mut(id.index())
        .ok_or(EcsError::UnregisteredComponent(type_name::<C>()))?;

    if slot.is_none() {
        let mut storage =
            ChunkSlotMap::<C, A>::with_shift(shift, alloc.clone(), MemoryTag::EcsComponentMap);
        storage.reserve(capacity)?;
        tracing::debug!(
            "created storage for `{}` ({} slots in {} chunks)",
            type_name::<C>(),
            storage.capacity(),
            storage.chunk_count()
        );
        *slot = Some(Box::new(storage));
    }

    typed_mut::<C, A>(slot).ok_or(EcsError::UnregisteredComponent(type_name::<C>()))
}

#[cold]
fn dead(entity: Entity) -> EcsError {
    EcsError::DeadEntity {
        index: entity.index(),
        generation: entity.generation(),
    }
}

#[cold]
fn missing<C: Component>(entity: Entity) -> EcsError {
    EcsError::MissingComponent {
        index: entity.index(),
        generation: entity.generation(),
        component: type_name::<C>(),
    }
}
