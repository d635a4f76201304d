use mserv_cache::KeyValueStore;
use std::rc::Rc;
use tracing::{debug, warn};

use crate::Result;

/// Storage key holding the JSON array of favorite ids
pub const FAVORITES_KEY: &str = "mserv_favorites";

/// Favorites shown when nothing usable is stored
pub const DEFAULT_FAVORITES: [&str; 4] = ["jellyfin", "portainer", "gitea", "nextcloud"];

/// Ordered set of favorite service ids, written through to storage
///
/// Every mutation persists the full list before returning. If the write
/// fails the in-memory list is left untouched, so memory and storage never
/// disagree after a call.
pub struct FavoritesStore {
    ids: Vec<String>,
    defaults: Vec<String>,
    storage: Rc<dyn KeyValueStore>,
}

impl FavoritesStore {
    pub fn new(storage: Rc<dyn KeyValueStore>) -> Self {
        Self::with_defaults(
            storage,
            DEFAULT_FAVORITES.iter().map(|s| s.to_string()).collect(),
        )
    }

    pub fn with_defaults(storage: Rc<dyn KeyValueStore>, defaults: Vec<String>) -> Self {
        Self {
            ids: Vec::new(),
            defaults: dedup(defaults),
            storage,
        }
    }

    /// Restore from storage. Absent or unparsable values fall back to the
    /// defaults in memory only; storage is not rewritten until a mutation.
    pub fn load_from_storage(&mut self) -> &[String] {
        self.ids = match self.storage.get(FAVORITES_KEY) {
            Ok(Some(raw)) if !raw.is_empty() => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(ids) => {
                    debug!("Restored {} favorites", ids.len());
                    dedup(ids)
                }
                Err(e) => {
                    warn!("Stored favorites are corrupt ({}), using defaults", e);
                    self.defaults.clone()
                }
            },
            Ok(_) => {
                debug!("No stored favorites, using defaults");
                self.defaults.clone()
            }
            Err(e) => {
                warn!("Could not read stored favorites ({}), using defaults", e);
                self.defaults.clone()
            }
        };
        &self.ids
    }

    pub fn get(&self) -> &[String] {
        &self.ids
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|f| f == id)
    }

    /// Append `id` unless it's already there. Adding twice is a no-op.
    pub fn add(&mut self, id: &str) -> Result<&[String]> {
        if self.contains(id) {
            return Ok(&self.ids);
        }

        let mut next = self.ids.clone();
        next.push(id.to_string());
        self.commit(next)?;
        debug!("Added favorite {}", id);
        Ok(&self.ids)
    }

    /// Drop `id` if present. Persists either way.
    pub fn remove(&mut self, id: &str) -> Result<&[String]> {
        let next: Vec<String> = self.ids.iter().filter(|f| *f != id).cloned().collect();
        self.commit(next)?;
        debug!("Removed favorite {}", id);
        Ok(&self.ids)
    }

    /// Flip membership; returns whether `id` is a favorite afterwards
    pub fn toggle(&mut self, id: &str) -> Result<bool> {
        if self.contains(id) {
            self.remove(id)?;
            Ok(false)
        } else {
            self.add(id)?;
            Ok(true)
        }
    }

    fn commit(&mut self, next: Vec<String>) -> Result<()> {
        let serialized = serde_json::to_string(&next)?;
        self.storage.set(FAVORITES_KEY, &serialized)?;
        self.ids = next;
        Ok(())
    }
}

fn dedup(ids: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::{mock, Sequence};
    use mserv_cache::{MemoryStore, StorageError};

    mock! {
        pub Storage {}
        impl KeyValueStore for Storage {
            fn get(&self, key: &str) -> mserv_cache::store::Result<Option<String>>;
            fn set(&self, key: &str, value: &str) -> mserv_cache::store::Result<()>;
            fn remove(&self, key: &str) -> mserv_cache::store::Result<()>;
        }
    }

    fn memory(entries: &[(&str, &str)]) -> Rc<MemoryStore> {
        Rc::new(MemoryStore::with_entries(entries.iter().copied()))
    }

    fn stored(storage: &MemoryStore) -> Option<String> {
        storage.get(FAVORITES_KEY).unwrap()
    }

    #[test]
    fn test_empty_storage_uses_defaults() {
        let storage = memory(&[]);
        let mut favorites = FavoritesStore::new(storage.clone());

        assert_eq!(
            favorites.load_from_storage(),
            &["jellyfin", "portainer", "gitea", "nextcloud"]
        );
        // Defaults live in memory only
        assert_eq!(stored(&storage), None);
    }

    #[test]
    fn test_corrupt_storage_uses_defaults_without_rewriting() {
        let storage = memory(&[(FAVORITES_KEY, "not json at all")]);
        let mut favorites = FavoritesStore::new(storage.clone());

        assert_eq!(
            favorites.load_from_storage(),
            &["jellyfin", "portainer", "gitea", "nextcloud"]
        );
        assert_eq!(stored(&storage).as_deref(), Some("not json at all"));
    }

    #[test]
    fn test_stored_list_is_restored_in_order() {
        let storage = memory(&[(FAVORITES_KEY, r#"["gitea","jellyfin","gitea"]"#)]);
        let mut favorites = FavoritesStore::new(storage);

        assert_eq!(favorites.load_from_storage(), &["gitea", "jellyfin"]);
    }

    #[test]
    fn test_stored_empty_list_is_respected() {
        let storage = memory(&[(FAVORITES_KEY, "[]")]);
        let mut favorites = FavoritesStore::new(storage);

        assert!(favorites.load_from_storage().is_empty());
    }

    #[test]
    fn test_add_then_remove_restores_previous_set() {
        let storage = memory(&[(FAVORITES_KEY, r#"["gitea"]"#)]);
        let mut favorites = FavoritesStore::new(storage.clone());
        favorites.load_from_storage();
        let before = favorites.get().to_vec();

        favorites.add("sonarr").unwrap();
        assert_eq!(stored(&storage).as_deref(), Some(r#"["gitea","sonarr"]"#));

        favorites.remove("sonarr").unwrap();
        assert_eq!(favorites.get(), before.as_slice());
        assert_eq!(stored(&storage).as_deref(), Some(r#"["gitea"]"#));
    }

    #[test]
    fn test_add_is_idempotent() {
        let storage = memory(&[(FAVORITES_KEY, "[]")]);
        let mut favorites = FavoritesStore::new(storage);
        favorites.load_from_storage();

        favorites.add("gitea").unwrap();
        favorites.add("gitea").unwrap();

        assert_eq!(favorites.get(), &["gitea"]);
    }

    #[test]
    fn test_each_mutation_persists_before_returning() {
        let mut storage = MockStorage::new();
        let mut seq = Sequence::new();

        storage
            .expect_get()
            .returning(|_| Ok(Some("[]".to_string())));
        storage
            .expect_set()
            .withf(|key, value| key == FAVORITES_KEY && value == r#"["gitea"]"#)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        storage
            .expect_set()
            .withf(|key, value| key == FAVORITES_KEY && value == "[]")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let mut favorites = FavoritesStore::new(Rc::new(storage));
        favorites.load_from_storage();

        // Second add must not write again
        favorites.add("gitea").unwrap();
        favorites.add("gitea").unwrap();
        favorites.remove("gitea").unwrap();
    }

    #[test]
    fn test_failed_write_leaves_memory_untouched() {
        let mut storage = MockStorage::new();
        storage
            .expect_get()
            .returning(|_| Ok(Some(r#"["gitea"]"#.to_string())));
        storage
            .expect_set()
            .returning(|_, _| Err(StorageError::Unavailable("disk full".to_string())));

        let mut favorites = FavoritesStore::new(Rc::new(storage));
        favorites.load_from_storage();

        assert!(favorites.add("sonarr").is_err());
        assert!(favorites.remove("gitea").is_err());
        assert_eq!(favorites.get(), &["gitea"]);
    }

    #[test]
    fn test_unreadable_storage_uses_defaults() {
        let mut storage = MockStorage::new();
        storage
            .expect_get()
            .returning(|_| Err(StorageError::Unavailable("locked".to_string())));

        let mut favorites =
            FavoritesStore::with_defaults(Rc::new(storage), vec!["gitea".to_string()]);
        assert_eq!(favorites.load_from_storage(), &["gitea"]);
    }

    #[test]
    fn test_toggle() {
        let storage = memory(&[(FAVORITES_KEY, r#"["gitea"]"#)]);
        let mut favorites = FavoritesStore::new(storage);
        favorites.load_from_storage();

        assert!(!favorites.toggle("gitea").unwrap());
        assert!(favorites.toggle("gitea").unwrap());
        assert!(favorites.contains("gitea"));
    }
}
