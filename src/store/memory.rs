// src/store/memory.rs
//
// In-memory stand-in for the real document store, used by the unit tests
// so repositories and services run without a MongoDB instance. Mirrors
// the filter semantics the repositories rely on: single-field equality,
// array-contains and compound equality, plus single-field ordering.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock};

use mongodb::bson::{Bson, Document};

use crate::error::StoreError;
use crate::store::{DocumentStore, SortOrder};

// Plain std locks: every critical section is a short map operation and
// nothing is held across an await.
#[derive(Clone, Default)]
pub struct MemStore {
    collections: Arc<RwLock<HashMap<String, BTreeMap<String, Document>>>>,
    broken: Arc<RwLock<HashSet<String>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write against `collection` fail, so tests
    /// can exercise the best-effort side-effect paths.
    pub fn break_writes(&self, collection: &str) {
        self.broken.write().unwrap().insert(collection.to_string());
    }

    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .unwrap()
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    fn check_writable(&self, collection: &str) -> Result<(), StoreError> {
        if self.broken.read().unwrap().contains(collection) {
            return Err(StoreError::Backend(format!(
                "injected write failure on {}",
                collection
            )));
        }
        Ok(())
    }
}

fn value_matches(stored: Option<&Bson>, expected: &Bson) -> bool {
    match stored {
        Some(Bson::Array(items)) if !matches!(expected, Bson::Array(_)) => {
            items.contains(expected)
        }
        Some(value) => value == expected,
        None => false,
    }
}

fn matches_filter(doc: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(key, expected)| value_matches(doc.get(key), expected))
}

fn bson_cmp(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => match (x, y) {
            (Bson::Int32(m), Bson::Int32(n)) => m.cmp(n),
            (Bson::Int64(m), Bson::Int64(n)) => m.cmp(n),
            (Bson::Int32(m), Bson::Int64(n)) => i64::from(*m).cmp(n),
            (Bson::Int64(m), Bson::Int32(n)) => m.cmp(&i64::from(*n)),
            (Bson::Double(m), Bson::Double(n)) => m.partial_cmp(n).unwrap_or(Ordering::Equal),
            (Bson::String(m), Bson::String(n)) => m.cmp(n),
            (Bson::Boolean(m), Bson::Boolean(n)) => m.cmp(n),
            _ => Ordering::Equal,
        },
    }
}

impl DocumentStore for MemStore {
    async fn insert(
        &self,
        collection: &'static str,
        id: &str,
        doc: Document,
    ) -> Result<(), StoreError> {
        self.check_writable(collection)?;
        let mut collections = self.collections.write().unwrap();
        let entries = collections.entry(collection.to_string()).or_default();
        if entries.contains_key(id) {
            return Err(StoreError::duplicate(collection, id));
        }
        entries.insert(id.to_string(), doc);
        Ok(())
    }

    async fn fetch(
        &self,
        collection: &'static str,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().unwrap();
        Ok(collections
            .get(collection)
            .and_then(|entries| entries.get(id))
            .cloned())
    }

    async fn replace(
        &self,
        collection: &'static str,
        id: &str,
        doc: Document,
    ) -> Result<(), StoreError> {
        self.check_writable(collection)?;
        let mut collections = self.collections.write().unwrap();
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc);
        Ok(())
    }

    async fn update_fields(
        &self,
        collection: &'static str,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        self.check_writable(collection)?;
        let mut collections = self.collections.write().unwrap();
        if let Some(doc) = collections
            .get_mut(collection)
            .and_then(|entries| entries.get_mut(id))
        {
            for (key, value) in fields {
                doc.insert(key, value);
            }
        }
        Ok(())
    }

    async fn delete(&self, collection: &'static str, id: &str) -> Result<(), StoreError> {
        self.check_writable(collection)?;
        let mut collections = self.collections.write().unwrap();
        if let Some(entries) = collections.get_mut(collection) {
            entries.remove(id);
        }
        Ok(())
    }

    async fn delete_where(
        &self,
        collection: &'static str,
        filter: Document,
    ) -> Result<u64, StoreError> {
        self.check_writable(collection)?;
        let mut collections = self.collections.write().unwrap();
        let Some(entries) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = entries.len();
        entries.retain(|_, doc| !matches_filter(doc, &filter));
        Ok((before - entries.len()) as u64)
    }

    async fn find(
        &self,
        collection: &'static str,
        filter: Document,
        sort: Option<(&'static str, SortOrder)>,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().unwrap();
        let mut docs: Vec<Document> = collections
            .get(collection)
            .map(|entries| {
                entries
                    .values()
                    .filter(|doc| matches_filter(doc, &filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some((field, order)) = sort {
            docs.sort_by(|a, b| {
                let ordering = bson_cmp(a.get(field), b.get(field));
                match order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            });
        }
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[tokio::test]
    async fn insert_rejects_duplicate_ids() {
        let store = MemStore::new();
        store
            .insert("tasks", "t-1", doc! { "id": "t-1" })
            .await
            .unwrap();

        let err = store
            .insert("tasks", "t-1", doc! { "id": "t-1" })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { .. }));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemStore::new();
        store
            .insert("tasks", "t-1", doc! { "id": "t-1" })
            .await
            .unwrap();

        store.delete("tasks", "t-1").await.unwrap();
        store.delete("tasks", "t-1").await.unwrap();
        assert_eq!(store.count("tasks"), 0);
    }

    #[tokio::test]
    async fn find_matches_arrays_by_containment() {
        let store = MemStore::new();
        store
            .insert("groups", "g-1", doc! { "id": "g-1", "members": ["u-1", "u-2"] })
            .await
            .unwrap();
        store
            .insert("groups", "g-2", doc! { "id": "g-2", "members": ["u-3"] })
            .await
            .unwrap();

        let found = store
            .find("groups", doc! { "members": "u-2" }, None)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get_str("id").unwrap(), "g-1");
    }

    #[tokio::test]
    async fn find_applies_compound_equality() {
        let store = MemStore::new();
        store
            .insert(
                "labels",
                "l-1",
                doc! { "id": "l-1", "groupId": "g-1", "isShared": true },
            )
            .await
            .unwrap();
        store
            .insert(
                "labels",
                "l-2",
                doc! { "id": "l-2", "groupId": "g-1", "isShared": false },
            )
            .await
            .unwrap();

        let found = store
            .find("labels", doc! { "groupId": "g-1", "isShared": true }, None)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get_str("id").unwrap(), "l-1");
    }

    #[tokio::test]
    async fn find_sorts_descending() {
        let store = MemStore::new();
        for (id, ts) in [("n-1", 10i64), ("n-2", 30), ("n-3", 20)] {
            store
                .insert("notifications", id, doc! { "id": id, "timestamp": ts })
                .await
                .unwrap();
        }

        let found = store
            .find(
                "notifications",
                doc! {},
                Some(("timestamp", SortOrder::Descending)),
            )
            .await
            .unwrap();
        let ids: Vec<&str> = found.iter().map(|d| d.get_str("id").unwrap()).collect();
        assert_eq!(ids, vec!["n-2", "n-3", "n-1"]);
    }

    #[tokio::test]
    async fn update_fields_leaves_other_fields_alone() {
        let store = MemStore::new();
        store
            .insert("tasks", "t-1", doc! { "id": "t-1", "title": "a", "isCompleted": false })
            .await
            .unwrap();

        store
            .update_fields("tasks", "t-1", doc! { "isCompleted": true })
            .await
            .unwrap();

        let doc = store.fetch("tasks", "t-1").await.unwrap().unwrap();
        assert_eq!(doc.get_str("title").unwrap(), "a");
        assert!(doc.get_bool("isCompleted").unwrap());
    }

    #[tokio::test]
    async fn broken_collection_rejects_writes_only() {
        let store = MemStore::new();
        store
            .insert("notifications", "n-1", doc! { "id": "n-1" })
            .await
            .unwrap();
        store.break_writes("notifications");

        assert!(store
            .insert("notifications", "n-2", doc! { "id": "n-2" })
            .await
            .is_err());
        // Reads still work.
        assert!(store.fetch("notifications", "n-1").await.unwrap().is_some());
    }
}
