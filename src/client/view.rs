use crate::book::Book;
use crate::client::{AddForm, ApiClient, UpdateForm};
use std::io;
use std::io::Write;
use std::path::Path;
use tracing::{error, info};

/// 요청이 처리되는 동안 stderr에 로딩 표시를 남긴다. drop 되면 지워진다.
pub struct Loading;

impl Loading {
    pub fn start() -> Self {
        eprint!("Loading...");
        let _ = io::stderr().flush();
        Loading
    }
}

impl Drop for Loading {
    fn drop(&mut self) {
        eprint!("\r\x1b[2K");
        let _ = io::stderr().flush();
    }
}

/// 도서 목록을 한 줄에 한 권씩 출력한다.
pub fn render_books<W: Write>(out: &mut W, client: &ApiClient, books: &[Book]) -> io::Result<()> {
    writeln!(out, "List of Books")?;

    for (index, book) in books.iter().enumerate() {
        let image = book.image.as_deref()
            .map(|image| client.image_url(image))
            .unwrap_or_else(|| "-".to_owned());

        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            index + 1,
            book.book_name.as_deref().unwrap_or_default(),
            book.author.as_deref().unwrap_or_default(),
            book.description.as_deref().unwrap_or_default(),
            image,
        )?;
        writeln!(out, "\tupdate: update {0}  delete: delete {0}", book.id)?;
    }

    writeln!(out, "Add: add --book-name <NAME> --author <AUTHOR> --description <DESCRIPTION> [--image <PATH>]")
}

pub fn render_book<W: Write>(out: &mut W, client: &ApiClient, book: Option<&Book>) -> io::Result<()> {
    match book {
        Some(book) => render_books(out, client, std::slice::from_ref(book)),
        None => writeln!(out, "No book"),
    }
}

pub fn list_view<W: Write>(out: &mut W, client: &ApiClient) -> io::Result<()> {
    let result = {
        let _loading = Loading::start();
        client.list()
    };

    match result {
        Ok(books) => render_books(out, client, &books),
        Err(e) => {
            error!("{}", e);
            Ok(())
        }
    }
}

pub fn show_view<W: Write>(out: &mut W, client: &ApiClient, id: &str) -> io::Result<()> {
    let result = {
        let _loading = Loading::start();
        client.single(id)
    };

    match result {
        Ok(book) => render_book(out, client, book.as_ref()),
        Err(e) => {
            error!("{}", e);
            Ok(())
        }
    }
}

/// 도서를 등록하고 성공하면 목록으로 돌아간다.
pub fn add_view<W: Write>(out: &mut W, client: &ApiClient, form: &AddForm, image: Option<&Path>) -> io::Result<()> {
    let result = {
        let _loading = Loading::start();
        client.add(form, image)
    };

    match result {
        Ok(message) => {
            info!("{}", message);
            list_view(out, client)
        }
        Err(e) => {
            error!("{}", e);
            Ok(())
        }
    }
}

/// 현재 도서 정보로 폼을 채우고 전달된 항목만 바꿔 수정한 뒤 목록으로 돌아간다.
/// 현재 도서 정보를 가져오지 못하면 수정 요청을 보내지 않는다.
pub fn update_view<W: Write>(
    out: &mut W,
    client: &ApiClient,
    id: &str,
    book_name: Option<String>,
    author: Option<String>,
    description: Option<String>,
) -> io::Result<()> {
    let current = {
        let _loading = Loading::start();
        client.single(id)
    };

    let form = match current {
        Ok(Some(book)) => UpdateForm::from_book(&book),
        Ok(None) => {
            error!("Book not found: {}", id);
            return Ok(());
        }
        Err(e) => {
            error!("{}", e);
            return Ok(());
        }
    };
    let form = form.apply(book_name, author, description);

    let result = {
        let _loading = Loading::start();
        client.update(id, &form)
    };

    match result {
        Ok(message) => {
            info!("{}", message);
            list_view(out, client)
        }
        Err(e) => {
            error!("{}", e);
            Ok(())
        }
    }
}

/// 도서를 삭제하고 목록으로 돌아간다.
pub fn delete_view<W: Write>(out: &mut W, client: &ApiClient, id: &str) -> io::Result<()> {
    let result = {
        let _loading = Loading::start();
        client.delete(id)
    };

    match result {
        Ok(message) => {
            info!("{}", message);
            list_view(out, client)
        }
        Err(e) => {
            error!("{}", e);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::repository::memory::MemoryBookRepository;
    use crate::book::repository::BookRepository;
    use crate::book::{BookChanges, Error, NewBook};
    use crate::client::tests::spawn_server;
    use async_trait::async_trait;
    use futures::executor::block_on;
    use std::sync::Arc;

    /// 조회만 실패하고 나머지 연산은 그대로 처리하는 저장소
    struct FailingLookups(Arc<MemoryBookRepository>);

    #[async_trait]
    impl BookRepository for FailingLookups {
        async fn find_all(&self) -> Result<Vec<Book>, Error> {
            self.0.find_all().await
        }

        async fn find_by_id(&self, _id: &str) -> Result<Option<Book>, Error> {
            Err(Error::StoreFailed("read timed out".to_owned()))
        }

        async fn new_book(&self, book: &NewBook) -> Result<String, Error> {
            self.0.new_book(book).await
        }

        async fn update_book(&self, id: &str, changes: &BookChanges) -> Result<Option<Book>, Error> {
            self.0.update_book(id, changes).await
        }

        async fn delete_book(&self, id: &str) -> Result<Option<Book>, Error> {
            self.0.delete_book(id).await
        }
    }

    fn dune() -> NewBook {
        NewBook {
            book_name: Some("Dune".to_owned()),
            author: Some("Herbert".to_owned()),
            description: Some("Sci-fi".to_owned()),
            image: None,
        }
    }

    fn book(id: &str, name: &str, image: Option<&str>) -> Book {
        Book {
            id: id.to_owned(),
            book_name: Some(name.to_owned()),
            author: Some("Herbert".to_owned()),
            description: None,
            image: image.map(str::to_owned),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn one_row_per_book_with_image_url() {
        let client = ApiClient::new("http://localhost:5000").unwrap();
        let books = vec![
            book("65f1a2b3c4d5e6f708091a2b", "Dune", Some("uploads/1700000000000.jpg")),
            book("65f1a2b3c4d5e6f708091a2c", "Emma", None),
        ];
        let mut out = Vec::new();

        render_books(&mut out, &client, &books).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "List of Books");
        assert_eq!(lines[1], "1\tDune\tHerbert\t\thttp://localhost:5000/uploads/1700000000000.jpg");
        assert_eq!(lines[2], "\tupdate: update 65f1a2b3c4d5e6f708091a2b  delete: delete 65f1a2b3c4d5e6f708091a2b");
        assert_eq!(lines[3], "2\tEmma\tHerbert\t\t-");
    }

    #[test]
    fn missing_book_is_reported() {
        let client = ApiClient::new("http://localhost:5000").unwrap();
        let mut out = Vec::new();

        render_book(&mut out, &client, None).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "No book\n");
    }

    #[test]
    fn failed_lookup_leaves_the_book_untouched() {
        let repository = Arc::new(MemoryBookRepository::new());
        let id = block_on(repository.new_book(&dune())).unwrap();
        let client = ApiClient::new(&spawn_server(Arc::new(FailingLookups(repository.clone())), "failed-lookup")).unwrap();
        let mut out = Vec::new();

        update_view(&mut out, &client, &id, Some("Dune (revised)".to_owned()), None, None).unwrap();

        let books = block_on(repository.find_all()).unwrap();
        assert_eq!(books[0].book_name.as_deref(), Some("Dune"));
        assert_eq!(books[0].author.as_deref(), Some("Herbert"));
        assert_eq!(books[0].description.as_deref(), Some("Sci-fi"));
        assert!(out.is_empty());
    }

    #[test]
    fn missing_book_is_not_updated() {
        let repository = Arc::new(MemoryBookRepository::new());
        let client = ApiClient::new(&spawn_server(repository.clone(), "missing-update")).unwrap();
        let mut out = Vec::new();

        update_view(&mut out, &client, "65f1a2b3c4d5e6f708091a2b", Some("Dune".to_owned()), None, None).unwrap();

        assert!(out.is_empty());
        assert!(repository.is_empty());
    }

    #[test]
    fn views_return_to_the_list_after_each_change() {
        let repository = Arc::new(MemoryBookRepository::new());
        let client = ApiClient::new(&spawn_server(repository.clone(), "views")).unwrap();
        let form = AddForm {
            book_name: "Dune".to_owned(),
            author: "Herbert".to_owned(),
            description: "Sci-fi".to_owned(),
        };

        let mut added = Vec::new();
        add_view(&mut added, &client, &form, None).unwrap();
        let added = String::from_utf8(added).unwrap();
        assert!(added.starts_with("List of Books\n1\tDune\tHerbert\tSci-fi\t-\n"));

        let id = block_on(repository.find_all()).unwrap()[0].id.clone();
        let mut updated = Vec::new();
        update_view(&mut updated, &client, &id, None, Some("Frank Herbert".to_owned()), None).unwrap();
        assert!(String::from_utf8(updated).unwrap().contains("1\tDune\tFrank Herbert\tSci-fi\t-"));

        let mut deleted = Vec::new();
        delete_view(&mut deleted, &client, &id).unwrap();
        let deleted = String::from_utf8(deleted).unwrap();
        assert_eq!(deleted.lines().count(), 2);
        assert!(repository.is_empty());
    }
}
