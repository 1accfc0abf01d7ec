use crate::book::repository::mongo::parse_id;
use crate::book::repository::BookRepository;
use crate::book::{Book, BookChanges, Error, NewBook};
use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use std::sync::RwLock;

/// 메모리에 도서를 보관하는 저장소
///
/// MongoDB와 같은 아이디 형식, 같은 에러 규칙을 따른다. 저장 순서가 곧 조회 순서다.
#[derive(Default)]
pub struct MemoryBookRepository {
    books: RwLock<Vec<Book>>,
    unavailable: bool,
}

impl MemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 모든 호출이 [`Error::StoreFailed`]로 실패하는 저장소
    pub fn unavailable() -> Self {
        Self {
            books: RwLock::new(vec![]),
            unavailable: true,
        }
    }

    pub fn len(&self) -> usize {
        self.books.read().map(|books| books.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<(), Error> {
        if self.unavailable {
            return Err(Error::StoreFailed("store is unavailable".to_owned()));
        }
        Ok(())
    }
}

fn poisoned<E>(_: E) -> Error {
    Error::StoreFailed("lock poisoned".to_owned())
}

#[async_trait]
impl BookRepository for MemoryBookRepository {
    async fn find_all(&self) -> Result<Vec<Book>, Error> {
        self.check_available()?;
        let books = self.books.read().map_err(poisoned)?;

        Ok(books.clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Book>, Error> {
        self.check_available()?;
        parse_id(id)?;
        let books = self.books.read().map_err(poisoned)?;

        Ok(books.iter().find(|b| b.id == id).cloned())
    }

    async fn new_book(&self, book: &NewBook) -> Result<String, Error> {
        self.check_available()?;
        let now = Utc::now();
        let id = ObjectId::new().to_hex();

        let mut books = self.books.write().map_err(poisoned)?;
        books.push(Book {
            id: id.clone(),
            book_name: book.book_name.clone(),
            author: book.author.clone(),
            description: book.description.clone(),
            image: book.image.clone(),
            created_at: Some(now),
            updated_at: Some(now),
        });

        Ok(id)
    }

    async fn update_book(&self, id: &str, changes: &BookChanges) -> Result<Option<Book>, Error> {
        self.check_available()?;
        parse_id(id)?;
        let mut books = self.books.write().map_err(poisoned)?;

        let previous = books.iter_mut()
            .find(|b| b.id == id)
            .map(|book| {
                let previous = book.clone();
                changes.apply_to(book);
                book.updated_at = Some(Utc::now());
                previous
            });

        Ok(previous)
    }

    async fn delete_book(&self, id: &str) -> Result<Option<Book>, Error> {
        self.check_available()?;
        parse_id(id)?;
        let mut books = self.books.write().map_err(poisoned)?;

        let deleted = books.iter()
            .position(|b| b.id == id)
            .map(|index| books.remove(index));

        Ok(deleted)
    }
}
