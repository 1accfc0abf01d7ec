use book_store::client::view;
use book_store::client::{AddForm, ApiClient};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "book-store-client", about = "Lists, adds, updates and deletes books in a book store")]
struct Cli {
    /// 서버 주소
    #[arg(long, env = "BOOK_STORE_URL", default_value = "http://localhost:5000")]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 도서 목록
    List,

    /// 도서 한 권 조회
    Show { id: String },

    /// 도서 등록
    Add {
        #[arg(long, default_value = "")]
        book_name: String,

        #[arg(long, default_value = "")]
        author: String,

        #[arg(long, default_value = "")]
        description: String,

        /// 표지 이미지 (png, jpg)
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// 도서 수정, 전달하지 않은 항목은 현재 값을 유지한다.
    Update {
        id: String,

        #[arg(long)]
        book_name: Option<String>,

        #[arg(long)]
        author: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// 도서 삭제
    Delete { id: String },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let client = ApiClient::new(&cli.base_url)?;
    let mut out = io::stdout().lock();

    match cli.command {
        Command::List => view::list_view(&mut out, &client)?,
        Command::Show { id } => view::show_view(&mut out, &client, &id)?,
        Command::Add { book_name, author, description, image } => {
            let form = AddForm { book_name, author, description };
            view::add_view(&mut out, &client, &form, image.as_deref())?
        }
        Command::Update { id, book_name, author, description } => {
            view::update_view(&mut out, &client, &id, book_name, author, description)?
        }
        Command::Delete { id } => view::delete_view(&mut out, &client, &id)?,
    }

    Ok(())
}
