pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod models;
pub mod repl;
pub mod server;
pub mod session;

use agent::ChatAgent;
use cli::Args;
use error::BoxError;
use log::info;
use server::Server;
use session::SessionDefaults;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), BoxError> {
    info!("--- Core Configuration ---");
    info!("Chat Client Type: {}", args.chat_client_type);
    info!("Chat Model: {}", args.chat_model);
    info!("Chat Base URL: {}", args.chat_base_url);
    info!("Chat API URL: {}", args.chat_api_url);
    info!("Chat Extended API URL: {}", args.chat_extended_api_url);
    info!("Extended Context: {}", args.extended_context);
    info!("API Key Set: {}", !args.chat_api_key.is_empty());
    info!("Streaming: {}", !args.disable_streaming);
    info!("File Reader Mode: {}", args.file_reader);
    info!("Max File Context Chars: {}", args.max_file_context_chars);
    info!("Initial Task Type: {}", args.task_type.as_deref().unwrap_or("none"));
    info!("Interactive: {}", args.interactive);
    info!("-------------------------");

    let defaults = SessionDefaults::from_args(&args)?;
    let agent = Arc::new(ChatAgent::from_args(&args)?);

    if args.interactive {
        return repl::run_repl(&agent, &defaults, args.file.as_deref()).await;
    }

    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, agent, defaults);
    server.run().await?;

    Ok(())
}
