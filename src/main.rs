use clap::Parser;
use doc_chat::cli::Args;
use doc_chat::error::BoxError;
use dotenv::dotenv;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    doc_chat::run(args).await
}
