//! In-memory entity store.
//!
//! One `Collection` per entity kind, each behind its own `RwLock`: reads
//! run concurrently, mutations on a kind are serialized, and no reader can
//! observe a half-applied mutation. Identifiers are per-kind counters
//! assigned under the write lock, so concurrent creates never collide.

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::error::ServiceError;
use crate::types::{Car, Dinosaur, Entity, EntityKind, Movie, Pet, Plant};

/// Field mapping used for create and partial update.
pub type Fields = Map<String, Value>;

/// Keyed, insertion-ordered collection of one record type.
pub struct Collection<T: Entity> {
    inner: RwLock<Inner<T>>,
}

struct Inner<T> {
    records: IndexMap<String, T>,
    next_id: u64,
}

impl<T: Entity> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> Collection<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                records: IndexMap::new(),
                next_id: 0,
            }),
        }
    }

    /// Builds a record from `fields` merged onto the default template and
    /// stores it under a fresh identifier.
    pub fn create(&self, fields: Fields) -> Result<T, ServiceError> {
        let record = merge_fields(&T::default(), fields)?;
        Ok(self.insert(record))
    }

    /// Stores an already-typed record, replacing whatever id it carried.
    pub fn insert(&self, mut record: T) -> T {
        let mut inner = self.inner.write();
        inner.next_id += 1;
        let id = inner.next_id.to_string();
        record.set_id(id.clone());
        inner.records.insert(id, record.clone());
        record
    }

    pub fn get(&self, id: &str) -> Result<T, ServiceError> {
        self.inner
            .read()
            .records
            .get(id)
            .cloned()
            .ok_or_else(|| not_found::<T>(id))
    }

    /// All records in insertion order.
    pub fn list(&self) -> Vec<T> {
        self.inner.read().records.values().cloned().collect()
    }

    /// Merges `fields` over the stored record. The identifier never changes.
    pub fn update(&self, id: &str, fields: Fields) -> Result<T, ServiceError> {
        let mut inner = self.inner.write();
        let current = inner.records.get(id).ok_or_else(|| not_found::<T>(id))?;
        let updated = merge_fields(current, fields)?;
        inner.records.insert(id.to_owned(), updated.clone());
        Ok(updated)
    }

    pub fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.inner
            .write()
            .records
            .shift_remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found::<T>(id))
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn not_found<T: Entity>(id: &str) -> ServiceError {
    ServiceError::not_found(format!("{} '{id}' not found", T::KIND))
}

fn to_json<T: Entity>(record: &T) -> Result<Value, ServiceError> {
    serde_json::to_value(record).map_err(|e| ServiceError::Internal(e.to_string()))
}

/// Overlays `fields` onto the JSON form of `base` and decodes the result.
///
/// The identifier field is skipped; unknown keys are dropped by serde.
fn merge_fields<T: Entity>(base: &T, fields: Fields) -> Result<T, ServiceError> {
    let mut json = to_json(base)?;
    let Value::Object(obj) = &mut json else {
        return Err(ServiceError::Internal(format!(
            "{} does not serialize to an object",
            T::KIND
        )));
    };
    let id_field = T::KIND.id_field();
    for (key, value) in fields {
        if key != id_field {
            obj.insert(key, value);
        }
    }
    serde_json::from_value(json)
        .map_err(|e| ServiceError::bad_request(format!("invalid {} fields: {e}", T::KIND)))
}

// ---------------------------------------------------------------------------
// Kind-erased access
// ---------------------------------------------------------------------------

/// Kind-erased view of a collection, records as JSON objects.
///
/// Protocol adapters work on this view so one code path serves every kind.
pub trait RecordCollection: Send + Sync {
    fn kind(&self) -> EntityKind;
    fn create_record(&self, fields: Fields) -> Result<Value, ServiceError>;
    fn get_record(&self, id: &str) -> Result<Value, ServiceError>;
    fn list_records(&self) -> Result<Vec<Value>, ServiceError>;
    fn update_record(&self, id: &str, fields: Fields) -> Result<Value, ServiceError>;
    fn delete_record(&self, id: &str) -> Result<(), ServiceError>;
    fn count(&self) -> usize;
    /// JSON form of an empty record; exposes declared field names and types.
    fn template(&self) -> Result<Value, ServiceError>;
}

impl<T: Entity> RecordCollection for Collection<T> {
    fn kind(&self) -> EntityKind {
        T::KIND
    }

    fn create_record(&self, fields: Fields) -> Result<Value, ServiceError> {
        to_json(&self.create(fields)?)
    }

    fn get_record(&self, id: &str) -> Result<Value, ServiceError> {
        to_json(&self.get(id)?)
    }

    fn list_records(&self) -> Result<Vec<Value>, ServiceError> {
        self.list().iter().map(to_json).collect()
    }

    fn update_record(&self, id: &str, fields: Fields) -> Result<Value, ServiceError> {
        to_json(&self.update(id, fields)?)
    }

    fn delete_record(&self, id: &str) -> Result<(), ServiceError> {
        self.delete(id)
    }

    fn count(&self) -> usize {
        self.len()
    }

    fn template(&self) -> Result<Value, ServiceError> {
        to_json(&T::default())
    }
}

/// The shared record store: one collection per entity kind.
#[derive(Default)]
pub struct EntityStore {
    pets: Collection<Pet>,
    dinosaurs: Collection<Dinosaur>,
    cars: Collection<Car>,
    movies: Collection<Movie>,
    plants: Collection<Plant>,
}

impl EntityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with the demo records.
    pub fn seeded() -> Self {
        let store = Self::new();
        crate::seed::populate(&store);
        store
    }

    pub fn pets(&self) -> &Collection<Pet> {
        &self.pets
    }

    pub fn dinosaurs(&self) -> &Collection<Dinosaur> {
        &self.dinosaurs
    }

    pub fn cars(&self) -> &Collection<Car> {
        &self.cars
    }

    pub fn movies(&self) -> &Collection<Movie> {
        &self.movies
    }

    pub fn plants(&self) -> &Collection<Plant> {
        &self.plants
    }

    pub fn collection(&self, kind: EntityKind) -> &dyn RecordCollection {
        match kind {
            EntityKind::Pet => &self.pets,
            EntityKind::Dinosaur => &self.dinosaurs,
            EntityKind::Car => &self.cars,
            EntityKind::Movie => &self.movies,
            EntityKind::Plant => &self.plants,
        }
    }

    // --- Kind-dispatched operations ---

    pub fn create(&self, kind: EntityKind, fields: Fields) -> Result<Value, ServiceError> {
        let record = self.collection(kind).create_record(fields)?;
        tracing::debug!(%kind, "record created");
        Ok(record)
    }

    pub fn get(&self, kind: EntityKind, id: &str) -> Result<Value, ServiceError> {
        self.collection(kind).get_record(id)
    }

    pub fn list(&self, kind: EntityKind) -> Result<Vec<Value>, ServiceError> {
        self.collection(kind).list_records()
    }

    pub fn update(&self, kind: EntityKind, id: &str, fields: Fields) -> Result<Value, ServiceError> {
        self.collection(kind).update_record(id, fields)
    }

    pub fn delete(&self, kind: EntityKind, id: &str) -> Result<(), ServiceError> {
        self.collection(kind).delete_record(id)?;
        tracing::debug!(%kind, id, "record deleted");
        Ok(())
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.collection(kind).count()
    }

    /// Copies `args` into store fields, rejecting any key the kind does not
    /// declare. Keys in `skip` are dropped; the identifier is never settable.
    pub fn declared_fields(
        &self,
        kind: EntityKind,
        args: &Fields,
        skip: &[&str],
    ) -> Result<Fields, ServiceError> {
        let template = self.collection(kind).template()?;
        let mut fields = Fields::new();
        for (key, value) in args {
            if skip.contains(&key.as_str()) {
                continue;
            }
            if key == kind.id_field() || template.get(key).is_none() {
                return Err(ServiceError::bad_request(format!(
                    "unknown field '{key}' for {kind}"
                )));
            }
            fields.insert(key.clone(), value.clone());
        }
        Ok(fields)
    }
}

/// Truncates `records` to `limit` entries when a limit is given.
pub fn apply_limit(mut records: Vec<Value>, limit: Option<usize>) -> Vec<Value> {
    if let Some(limit) = limit {
        records.truncate(limit);
    }
    records
}
