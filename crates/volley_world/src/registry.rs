//! Entity Registry - single source of truth for what exists right now
//!
//! Every live entity maps its [`EntityId`] to its simulation body (if any),
//! its visual proxy and its lifecycle metadata. Ids are handed out from a
//! monotonically increasing counter and never reused, so a stale id can only
//! ever miss, never alias a newer entity.
//!
//! Entities are kept in a `BTreeMap` keyed by id. Because ids only grow, key
//! order is insertion order, which is what kind snapshots iterate in.

use crate::error::RegistryError;
use crate::projectile::ProjectileState;
use crate::scene::VisualProxy;
use crate::trail::TrailState;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;
use volley_physics::BodyHandle;

/// Process-unique entity identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    /// Raw numeric value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// The player capsule, driven by an external controller
    Player,
    /// Immovable level geometry
    StaticGeometry,
    /// Physics-driven props
    DynamicProp,
    /// Fired rounds
    Projectile,
    /// Decorative smoke behind projectiles
    TrailParticle,
    /// One-shot flash at the muzzle
    MuzzleFlash,
}

impl EntityKind {
    /// Whether entities of this kind must own a body
    pub fn requires_body(self) -> bool {
        matches!(self, Self::Projectile)
    }

    /// Whether entities of this kind may never own a body
    pub fn forbids_body(self) -> bool {
        matches!(self, Self::TrailParticle | Self::MuzzleFlash)
    }
}

/// Manager-specific metadata
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EntityState {
    #[default]
    None,
    Projectile(ProjectileState),
    Trail(TrailState),
}

/// A live entity
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    body: Option<BodyHandle>,
    /// Renderable stand-in
    pub proxy: VisualProxy,
    created_at: Duration,
    time_to_live: Option<Duration>,
    /// Manager-specific metadata
    pub state: EntityState,
}

impl Entity {
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Simulation body, if the entity has one
    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    /// Simulation time the entity was registered at
    pub fn created_at(&self) -> Duration {
        self.created_at
    }

    /// Lifetime; `None` lives until explicitly removed
    pub fn time_to_live(&self) -> Option<Duration> {
        self.time_to_live
    }

    /// Time since creation, zero if `now` precedes it
    pub fn age(&self, now: Duration) -> Duration {
        now.saturating_sub(self.created_at)
    }

    /// Strictly older than its time-to-live
    pub fn is_expired(&self, now: Duration) -> bool {
        self.time_to_live.is_some_and(|ttl| self.age(now) > ttl)
    }
}

/// Everything needed to register an entity
#[derive(Debug, Clone)]
pub struct EntityDesc {
    pub kind: EntityKind,
    pub body: Option<BodyHandle>,
    pub proxy: VisualProxy,
    pub created_at: Duration,
    pub time_to_live: Option<Duration>,
    pub state: EntityState,
}

impl EntityDesc {
    pub fn new(kind: EntityKind, proxy: VisualProxy, created_at: Duration) -> Self {
        Self {
            kind,
            body: None,
            proxy,
            created_at,
            time_to_live: None,
            state: EntityState::None,
        }
    }

    /// Attach a simulation body
    pub fn with_body(mut self, body: BodyHandle) -> Self {
        self.body = Some(body);
        self
    }

    /// Retire automatically once older than `ttl`
    pub fn with_time_to_live(mut self, ttl: Duration) -> Self {
        self.time_to_live = Some(ttl);
        self
    }

    /// Attach manager metadata
    pub fn with_state(mut self, state: EntityState) -> Self {
        self.state = state;
        self
    }
}

/// Snapshot of entity ids taken at one instant.
///
/// Iterating it while unregistering entities is safe: removed ids are simply
/// skipped by the caller's `get` lookups, and no element is ever skipped.
/// Clone it or call [`KindSnapshot::rewind`] to walk it again.
#[derive(Debug, Clone)]
pub struct KindSnapshot {
    ids: Vec<EntityId>,
    cursor: usize,
}

impl KindSnapshot {
    /// Restart from the first id
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }
}

impl Iterator for KindSnapshot {
    type Item = EntityId;

    fn next(&mut self) -> Option<EntityId> {
        let id = self.ids.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.ids.len() - self.cursor;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for KindSnapshot {}

/// Arena of live entities
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: BTreeMap<EntityId, Entity>,
    by_body: HashMap<BodyHandle, EntityId>,
    /// Live entities per kind
    kind_counts: HashMap<EntityKind, usize>,
    next_id: u64,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new entity and hand back its id
    pub fn register(&mut self, desc: EntityDesc) -> Result<EntityId, RegistryError> {
        match desc.body {
            None if desc.kind.requires_body() => {
                return Err(RegistryError::KindRequiresBody(desc.kind));
            }
            Some(_) if desc.kind.forbids_body() => {
                return Err(RegistryError::KindForbidsBody(desc.kind));
            }
            Some(body) => {
                if let Some(&owner) = self.by_body.get(&body) {
                    return Err(RegistryError::BodyAlreadyRegistered { body, owner });
                }
            }
            None => {}
        }

        self.next_id += 1;
        let id = EntityId(self.next_id);

        if let Some(body) = desc.body {
            self.by_body.insert(body, id);
        }
        *self.kind_counts.entry(desc.kind).or_default() += 1;

        self.entities.insert(
            id,
            Entity {
                id,
                kind: desc.kind,
                body: desc.body,
                proxy: desc.proxy,
                created_at: desc.created_at,
                time_to_live: desc.time_to_live,
                state: desc.state,
            },
        );

        log::trace!("Registered {:?} {}", desc.kind, id);
        Ok(id)
    }

    /// Drop bookkeeping for an entity.
    ///
    /// Resources are not released here; the returned entity still holds its
    /// body handle and proxy for the caller to dispose of.
    pub fn unregister(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;
        if let Some(body) = entity.body {
            self.by_body.remove(&body);
        }
        if let Some(count) = self.kind_counts.get_mut(&entity.kind) {
            *count = count.saturating_sub(1);
        }
        Some(entity)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Entity owning a simulation body
    pub fn entity_for_body(&self, body: BodyHandle) -> Option<EntityId> {
        self.by_body.get(&body).copied()
    }

    /// Ids of every entity of `kind`, in insertion order
    pub fn snapshot_of_kind(&self, kind: EntityKind) -> KindSnapshot {
        KindSnapshot {
            ids: self.iter_kind(kind).map(Entity::id).collect(),
            cursor: 0,
        }
    }

    /// Ids of every entity that owns a body, in insertion order
    pub fn snapshot_with_body(&self) -> KindSnapshot {
        KindSnapshot {
            ids: self
                .entities
                .values()
                .filter(|e| e.body.is_some())
                .map(Entity::id)
                .collect(),
            cursor: 0,
        }
    }

    /// Borrowing iterator over entities of `kind`
    pub fn iter_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values().filter(move |e| e.kind == kind)
    }

    /// All live entities in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    /// Live entities of `kind`, without walking the arena
    pub fn count_of_kind(&self, kind: EntityKind) -> usize {
        self.kind_counts.get(&kind).copied().unwrap_or(0)
    }

    /// Age of an entity at `now`
    pub fn age_of(&self, id: EntityId, now: Duration) -> Option<Duration> {
        self.get(id).map(|e| e.age(now))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
