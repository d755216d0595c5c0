//! In-memory person repository.
//!
//! The repository is the only place persons are created and the sole owner of
//! the id-to-person mapping. It hands out shared handles: mutating a person
//! through a handle returned by [`PersonRepository::find`] is visible to every
//! later lookup, because the handle aliases the stored instance.
//!
//! Locking is two-level. The outer lock serializes map inserts and lookups;
//! each person carries its own lock, so concurrent mutations to the *same*
//! person are serialized while different persons proceed in parallel. State
//! lives only in process memory and is discarded at process end.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::model::Person;

/// Shared handle to a stored person.
///
/// Lock it for reading to compute snapshots, or for writing to mutate
/// attributes and the drink history.
pub type PersonHandle = Arc<RwLock<Person>>;

/// Process-wide mapping from person id to person.
///
/// Cheap to clone; all clones share the same underlying map.
#[derive(Clone, Default)]
pub struct PersonRepository {
    entries: Arc<RwLock<HashMap<Uuid, PersonHandle>>>,
}

impl PersonRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a person and store it under its own id.
    ///
    /// # Errors
    ///
    /// Propagates the weight validation from [`Person::new`]; nothing is
    /// inserted on rejection.
    pub async fn create(&self, is_female: bool, weight: f64) -> Result<PersonHandle> {
        let person = Person::new(is_female, weight)?;
        let id = person.id();
        let handle = Arc::new(RwLock::new(person));

        self.entries.write().await.insert(id, Arc::clone(&handle));
        Ok(handle)
    }

    /// Look up a person by id.
    ///
    /// Absence is not an error at this layer; callers decide how to report an
    /// unknown id.
    pub async fn find(&self, id: Uuid) -> Option<PersonHandle> {
        self.entries.read().await.get(&id).map(Arc::clone)
    }

    /// Number of persons currently stored.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the repository holds no persons.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_find() {
        let repository = PersonRepository::new();

        let handle = repository.create(false, 80.0).await.unwrap();
        let id = handle.read().await.id();

        let found = repository.find(id).await.expect("person should be stored");
        assert_eq!(found.read().await.id(), id);
        assert_eq!(repository.len().await, 1);
    }

    #[tokio::test]
    async fn test_find_unknown_id() {
        let repository = PersonRepository::new();
        repository.create(true, 60.0).await.unwrap();

        assert!(repository.find(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_weight() {
        let repository = PersonRepository::new();

        assert!(repository.create(false, 0.0).await.is_err());
        assert!(repository.is_empty().await);
    }

    #[tokio::test]
    async fn test_mutations_visible_through_later_lookups() {
        let repository = PersonRepository::new();

        let handle = repository.create(false, 80.0).await.unwrap();
        let id = handle.read().await.id();

        handle.write().await.drink(0.5, 5.0).unwrap();

        // A fresh lookup aliases the same instance and sees the drink
        let found = repository.find(id).await.unwrap();
        assert_eq!(found.read().await.drink_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_drinks_are_not_lost() {
        let repository = PersonRepository::new();

        let handle = repository.create(false, 80.0).await.unwrap();
        let id = handle.read().await.id();

        let mut tasks = Vec::new();
        for _ in 0..50 {
            let repository = repository.clone();
            tasks.push(tokio::spawn(async move {
                let person = repository.find(id).await.unwrap();
                person.write().await.drink(0.1, 5.0).unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(handle.read().await.drink_count(), 50);
    }

    #[tokio::test]
    async fn test_concurrent_creates() {
        let repository = PersonRepository::new();

        let mut tasks = Vec::new();
        for i in 0..20 {
            let repository = repository.clone();
            tasks.push(tokio::spawn(async move {
                repository.create(i % 2 == 0, 70.0).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(repository.len().await, 20);
    }
}
