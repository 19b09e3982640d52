//! Generic entity repository
//!
//! Load-by-id is the only access path to stored entities. Ids are
//! deterministic (contract address or transaction hash + log index), so a
//! re-delivered input resolves to a load of the existing record.

use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Serialize};

use crate::utils::error::{IndexerError, IndexerResult};

/// A persisted entity kind
pub trait Entity: Clone + Serialize + DeserializeOwned {
    const KIND: &'static str;

    fn id(&self) -> String;
}

/// Outcome of [`Store::load_or_create`]
#[derive(Clone, Debug, PartialEq)]
pub enum Loaded<E> {
    Existing(E),
    Created(E),
}

impl<E> Loaded<E> {
    pub fn is_created(&self) -> bool {
        matches!(self, Loaded::Created(_))
    }

    pub fn into_inner(self) -> E {
        match self {
            Loaded::Existing(entity) | Loaded::Created(entity) => entity,
        }
    }
}

/// Key-addressable entity store
pub trait Store {
    fn load<E: Entity>(&self, id: &str) -> IndexerResult<Option<E>>;

    /// Creates or overwrites the entity under its id
    fn save<E: Entity>(&mut self, entity: &E) -> IndexerResult<()>;

    /// Number of stored entities of kind `E`
    fn count<E: Entity>(&self) -> usize;

    fn exists<E: Entity>(&self, id: &str) -> IndexerResult<bool> {
        Ok(self.load::<E>(id)?.is_some())
    }

    /// Loads `id`, or builds, saves and returns a new entity when absent.
    /// `create` is not invoked on the load path.
    fn load_or_create<E, F>(&mut self, id: &str, create: F) -> IndexerResult<Loaded<E>>
    where
        E: Entity,
        F: FnOnce() -> IndexerResult<E>,
    {
        if let Some(existing) = self.load::<E>(id)? {
            return Ok(Loaded::Existing(existing));
        }
        let entity = create()?;
        self.save(&entity)?;
        Ok(Loaded::Created(entity))
    }
}

/// In-memory store of serialized entities
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entities: BTreeMap<(&'static str, String), serde_json::Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entities of kind `E`, ordered by id
    pub fn all<E: Entity>(&self) -> IndexerResult<Vec<E>> {
        self.entities
            .iter()
            .filter(|((kind, _), _)| *kind == E::KIND)
            .map(|(_, value)| decode::<E>(value.clone()))
            .collect()
    }
}

fn decode<E: Entity>(value: serde_json::Value) -> IndexerResult<E> {
    serde_json::from_value(value).map_err(|err| {
        IndexerError::DecodingError(format!("Could not decode {}: {}", E::KIND, err))
    })
}

impl Store for MemoryStore {
    fn load<E: Entity>(&self, id: &str) -> IndexerResult<Option<E>> {
        self.entities
            .get(&(E::KIND, id.to_string()))
            .map(|value| decode::<E>(value.clone()))
            .transpose()
    }

    fn save<E: Entity>(&mut self, entity: &E) -> IndexerResult<()> {
        let value = serde_json::to_value(entity).map_err(|err| {
            IndexerError::DecodingError(format!("Could not encode {}: {}", E::KIND, err))
        })?;
        self.entities.insert((E::KIND, entity.id()), value);
        Ok(())
    }

    fn count<E: Entity>(&self) -> usize {
        self.entities.keys().filter(|(kind, _)| *kind == E::KIND).count()
    }
}
