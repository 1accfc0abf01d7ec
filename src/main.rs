use book_store::config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv();
    let config = config::load_config()?;

    let _guard = config::log::set_global_logging_config(config.logger())?;

    book_store::start_server(&config).await
}
