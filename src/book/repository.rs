use crate::book::{Book, BookChanges, Error, NewBook};
use async_trait::async_trait;
use std::sync::Arc;

pub mod memory;
pub mod mongo;

pub type SharedBookRepository = Arc<dyn BookRepository>;

/// 도서 저장소
///
/// 모든 연산은 저장소 호출 한번으로 끝나며 여러 문서에 걸친 트랜잭션은 없다.
/// 동시에 들어온 수정 요청은 나중에 저장된 값이 남는다.
#[async_trait]
pub trait BookRepository: Send + Sync {

    /// 저장된 모든 도서를 저장소 기본 순서대로 가져온다.
    async fn find_all(&self) -> Result<Vec<Book>, Error>;

    /// 아이디로 도서를 찾는다. 형식이 잘못된 아이디는 [`Error::InvalidId`]를 반환한다.
    async fn find_by_id(&self, id: &str) -> Result<Option<Book>, Error>;

    /// 새 도서를 저장하고 생성된 아이디를 반환한다.
    async fn new_book(&self, book: &NewBook) -> Result<String, Error>;

    /// 전달된 항목만 수정한다. 수정 전 도서를 반환하며 대상이 없으면 `None`을 반환한다.
    async fn update_book(&self, id: &str, changes: &BookChanges) -> Result<Option<Book>, Error>;

    /// 도서를 삭제하고 삭제된 도서를 반환한다. 대상이 없으면 `None`을 반환한다.
    async fn delete_book(&self, id: &str) -> Result<Option<Book>, Error>;
}
