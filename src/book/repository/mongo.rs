use crate::book::repository::BookRepository;
use crate::book::{Book, BookChanges, Error, NewBook};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Document};
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// `books` 컬렉션에 저장되는 도서 문서
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookEntity {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    book_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,

    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    created_at: Option<mongodb::bson::DateTime>,

    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<mongodb::bson::DateTime>,
}

impl BookEntity {
    pub fn from_new_book(book: &NewBook, now: mongodb::bson::DateTime) -> Self {
        Self {
            id: None,
            book_name: book.book_name.clone(),
            author: book.author.clone(),
            description: book.description.clone(),
            image: book.image.clone(),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    pub fn to_domain(&self) -> Book {
        Book {
            id: self.id.map(|id| id.to_hex()).unwrap_or_default(),
            book_name: self.book_name.clone(),
            author: self.author.clone(),
            description: self.description.clone(),
            image: self.image.clone(),
            created_at: self.created_at.and_then(to_chrono),
            updated_at: self.updated_at.and_then(to_chrono),
        }
    }
}

fn to_chrono(dt: mongodb::bson::DateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis())
}

/// 문자열 아이디를 `ObjectId`로 변환한다.
pub fn parse_id(id: &str) -> Result<ObjectId, Error> {
    ObjectId::parse_str(id).map_err(|_| Error::InvalidId(id.to_owned()))
}

/// 도서 수정에 사용할 `$set` 문서를 만든다. 이미지는 포함되지 않는다.
pub fn to_set_document(changes: &BookChanges, now: mongodb::bson::DateTime) -> Document {
    let mut set = Document::new();
    if let Some(book_name) = &changes.book_name {
        set.insert("book_name", book_name.as_str());
    }
    if let Some(author) = &changes.author {
        set.insert("author", author.as_str());
    }
    if let Some(description) = &changes.description {
        set.insert("description", description.as_str());
    }
    set.insert("updatedAt", now);

    doc! { "$set": set }
}

pub struct MongoBookRepository {
    client: Client,
    database: String,
    collection: String,
}

impl MongoBookRepository {
    pub fn new(client: Client, database: &str, collection: &str) -> Self {
        Self {
            client,
            database: database.to_owned(),
            collection: collection.to_owned(),
        }
    }

    fn collection(&self) -> Collection<BookEntity> {
        self.client
            .database(&self.database)
            .collection::<BookEntity>(&self.collection)
    }
}

#[async_trait]
impl BookRepository for MongoBookRepository {
    async fn find_all(&self) -> Result<Vec<Book>, Error> {
        let cursor = self.collection().find(doc! {}).await
            .map_err(|e| Error::StoreFailed(e.to_string()))?;

        let entities = cursor
            .try_collect::<Vec<BookEntity>>().await
            .map_err(|e| Error::StoreFailed(e.to_string()))?;

        Ok(entities.iter().map(|e| e.to_domain()).collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Book>, Error> {
        let oid = parse_id(id)?;

        let entity = self.collection().find_one(doc! { "_id": oid }).await
            .map_err(|e| Error::StoreFailed(e.to_string()))?;

        Ok(entity.map(|e| e.to_domain()))
    }

    async fn new_book(&self, book: &NewBook) -> Result<String, Error> {
        let entity = BookEntity::from_new_book(book, mongodb::bson::DateTime::now());

        let result = self.collection().insert_one(entity).await
            .map_err(|e| Error::StoreFailed(e.to_string()))?;

        let id = result.inserted_id.as_object_id()
            .map(|oid| oid.to_hex())
            .ok_or_else(|| Error::StoreFailed(format!("Unexpected inserted id: {}", result.inserted_id)))?;

        debug!("New book stored. (ID: {})", id);
        Ok(id)
    }

    async fn update_book(&self, id: &str, changes: &BookChanges) -> Result<Option<Book>, Error> {
        let oid = parse_id(id)?;
        let update = to_set_document(changes, mongodb::bson::DateTime::now());

        let previous = self.collection().find_one_and_update(doc! { "_id": oid }, update).await
            .map_err(|e| Error::StoreFailed(e.to_string()))?;

        Ok(previous.map(|e| e.to_domain()))
    }

    async fn delete_book(&self, id: &str) -> Result<Option<Book>, Error> {
        let oid = parse_id(id)?;

        let deleted = self.collection().find_one_and_delete(doc! { "_id": oid }).await
            .map_err(|e| Error::StoreFailed(e.to_string()))?;

        Ok(deleted.map(|e| e.to_domain()))
    }
}
