// src/store/mongo.rs

use futures_util::StreamExt;
use mongodb::bson::{doc, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};

use crate::error::StoreError;
use crate::store::{DocumentStore, SortOrder};

/// Production [`DocumentStore`] backed by MongoDB.
///
/// The entity id doubles as the Mongo `_id`, which is what turns an
/// insert against a taken id into a duplicate-key error instead of a
/// silent overwrite. The `_id` is stripped again on the way out so the
/// documents the rest of the code sees match the persisted entity layout
/// exactly.
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn init(uri: &str, db_name: &str) -> Self {
        let client_options = ClientOptions::parse(uri)
            .await
            .expect("Failed to parse MongoDB connection string");
        let client = Client::with_options(client_options).expect("Failed to initialize client");
        let db = client.database(db_name);
        MongoStore { db }
    }

    fn coll(&self, name: &str) -> mongodb::Collection<Document> {
        self.db.collection::<Document>(name)
    }
}

fn keyed(id: &str, mut doc: Document) -> Document {
    doc.insert("_id", id);
    doc
}

fn unkeyed(mut doc: Document) -> Document {
    doc.remove("_id");
    doc
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match &*err.kind {
        ErrorKind::Write(WriteFailure::WriteError(we)) => we.code == 11000,
        _ => false,
    }
}

impl DocumentStore for MongoStore {
    async fn insert(
        &self,
        collection: &'static str,
        id: &str,
        doc: Document,
    ) -> Result<(), StoreError> {
        match self.coll(collection).insert_one(keyed(id, doc)).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::duplicate(collection, id)),
            Err(e) => Err(StoreError::Backend(e.to_string())),
        }
    }

    async fn fetch(
        &self,
        collection: &'static str,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        self.coll(collection)
            .find_one(doc! { "_id": id })
            .await
            .map(|found| found.map(unkeyed))
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn replace(
        &self,
        collection: &'static str,
        id: &str,
        doc: Document,
    ) -> Result<(), StoreError> {
        self.coll(collection)
            .replace_one(doc! { "_id": id }, keyed(id, doc))
            .upsert(true)
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn update_fields(
        &self,
        collection: &'static str,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        self.coll(collection)
            .update_one(doc! { "_id": id }, doc! { "$set": fields })
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn delete(&self, collection: &'static str, id: &str) -> Result<(), StoreError> {
        // deleted_count 0 is fine: deleting an absent id is not an error.
        self.coll(collection)
            .delete_one(doc! { "_id": id })
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn delete_where(
        &self,
        collection: &'static str,
        filter: Document,
    ) -> Result<u64, StoreError> {
        self.coll(collection)
            .delete_many(filter)
            .await
            .map(|res| res.deleted_count)
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn find(
        &self,
        collection: &'static str,
        filter: Document,
        sort: Option<(&'static str, SortOrder)>,
    ) -> Result<Vec<Document>, StoreError> {
        let coll = self.coll(collection);
        let mut find = coll.find(filter);
        if let Some((field, order)) = sort {
            let direction = match order {
                SortOrder::Ascending => 1,
                SortOrder::Descending => -1,
            };
            find = find.sort(doc! { field: direction });
        }

        let mut cursor = find
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let mut docs = Vec::new();
        while let Some(result) = cursor.next().await {
            match result {
                Ok(doc) => docs.push(unkeyed(doc)),
                Err(e) => return Err(StoreError::Backend(e.to_string())),
            }
        }
        Ok(docs)
    }
}
