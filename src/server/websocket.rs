use crate::agent::ChatAgent;
use crate::config::task::TaskType;
use crate::error::{ BoxError, ChatError };
use crate::extract;
use crate::models::websocket::{ ClientMessage, ServerMessage };
use crate::session::{ SessionDefaults, SessionState };

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::io::{ AsyncRead, AsyncWrite };

use tokio_tungstenite::{ accept_async, WebSocketStream };
use tokio_tungstenite::tungstenite::protocol::Message;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;

use log::{ info, warn, error };
use futures::{ Sink, SinkExt, StreamExt };
use uuid::Uuid;

/// Frames above this size are refused; uploads travel base64-encoded inside one frame.
const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

pub async fn start_ws_server(
    addr: &str,
    agent: Arc<ChatAgent>,
    defaults: SessionDefaults
) -> Result<(), BoxError> {
    let listener = TcpListener::bind(addr).await?;
    info!("WS server listening on: {}", addr);
    serve(listener, agent, defaults).await
}

/// Accepts connections forever; each one is an independent chat session.
pub async fn serve(
    listener: TcpListener,
    agent: Arc<ChatAgent>,
    defaults: SessionDefaults
) -> Result<(), BoxError> {
    loop {
        let (stream, peer) = listener.accept().await?;
        info!("Incoming connection from: {}", peer);
        let agent_clone = Arc::clone(&agent);
        let defaults_clone = defaults.clone();

        tokio::spawn(async move {
            match accept_async(stream).await {
                Ok(ws) => handle_connection(peer, ws, agent_clone, defaults_clone).await,
                Err(e) => error!("Handshake failed for {}: {}", peer, e),
            }
        });
    }
}

pub async fn handle_connection<S>(
    peer: SocketAddr,
    websocket: WebSocketStream<S>,
    agent: Arc<ChatAgent>,
    defaults: SessionDefaults
)
    where S: AsyncRead + AsyncWrite + Unpin
{
    let (mut tx, mut rx) = websocket.split();
    let session_id = Uuid::new_v4().to_string();
    let mut state = defaults.new_session();
    info!("Assigned session ID {} to {}", session_id, peer);

    while let Some(msg) = rx.next().await {
        match msg {
            Ok(message) => {
                if message.len() > MAX_MESSAGE_SIZE {
                    warn!(
                        "Message from {} exceeds size limit ({} > {})",
                        peer,
                        message.len(),
                        MAX_MESSAGE_SIZE
                    );
                    let error_msg = ServerMessage::Error {
                        message: "Message too large".to_string(),
                    };
                    if send_json(&mut tx, &error_msg).await.is_err() {
                        error!("Failed to send size limit error to {}", peer);
                    }
                    break;
                }

                match message {
                    Message::Text(text) => {
                        let reply = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                handle_client_message(&agent, &mut state, client_msg, &mut tx).await
                            }
                            Err(e) => {
                                error!("Failed to parse message from {}: {}", peer, e);
                                let error_msg = ServerMessage::Error {
                                    message: format!("Failed to parse message: {}", e),
                                };
                                send_json(&mut tx, &error_msg).await
                            }
                        };
                        if let Err(e) = reply {
                            error!("Error sending to {}: {}", peer, e);
                            break;
                        }
                    }
                    Message::Close(_) => {
                        info!("Received close frame from {}", peer);
                        break;
                    }
                    Message::Ping(ping_data) => {
                        if tx.send(Message::Pong(ping_data)).await.is_err() {
                            error!("Failed to send pong to {}", peer);
                            break;
                        }
                    }
                    Message::Pong(_) => {}
                    Message::Binary(_) => {
                        warn!("Ignoring binary message from {}", peer);
                    }
                    Message::Frame(_) => {}
                }
            }
            Err(e) => {
                match e {
                    | tokio_tungstenite::tungstenite::Error::ConnectionClosed
                    | tokio_tungstenite::tungstenite::Error::Protocol(_)
                    | tokio_tungstenite::tungstenite::Error::Utf8 => {
                        info!("WebSocket connection closed or protocol error for {}: {}", peer, e);
                    }
                    tokio_tungstenite::tungstenite::Error::Io(ref io_err) if
                        io_err.kind() == std::io::ErrorKind::ConnectionReset
                    => {
                        info!("WebSocket connection reset by peer {}", peer);
                    }
                    _ => {
                        error!("Error receiving message from {}: {}", peer, e);
                    }
                }
                break;
            }
        }
    }
    info!(
        "WebSocket connection closed for {} (Session ID: {}, {} message(s) in history)",
        peer,
        session_id,
        state.history().len()
    );
}

/// Applies one client action to the session and writes the replies to `tx`.
///
/// Session errors are reported to the client as `error` messages; only a
/// failure to write to the socket is returned.
pub async fn handle_client_message<S>(
    agent: &ChatAgent,
    state: &mut SessionState,
    message: ClientMessage,
    tx: &mut S
) -> Result<(), BoxError>
    where S: Sink<Message> + Unpin, S::Error: std::error::Error + Send + Sync + 'static
{
    match message {
        ClientMessage::Chat { content } => handle_chat(agent, state, &content, tx).await,
        ClientMessage::Upload { filename, mime_type, data } => {
            match load_upload(state, &filename, mime_type.as_deref(), &data) {
                Ok(chars) => send_json(tx, &ServerMessage::FileLoaded { filename, chars }).await,
                Err(e) => {
                    warn!("Upload '{}' failed: {}", filename, e);
                    state.clear_file_context();
                    send_error(tx, &e).await
                }
            }
        }
        ClientMessage::SetDefaultPrompt { prompt } => {
            state.set_default_prompt(prompt);
            send_ack(tx, "set_default_prompt").await
        }
        ClientMessage::ClearDefaultPrompt => {
            state.clear_default_prompt();
            send_ack(tx, "clear_default_prompt").await
        }
        ClientMessage::SelectTask { task } => {
            match task.parse::<TaskType>() {
                Ok(task) => {
                    state.select_task(task);
                    send_ack(tx, "select_task").await
                }
                Err(e) => send_error(tx, &e).await,
            }
        }
        ClientMessage::SkipDefaultPrompt { enabled } => {
            state.set_skip_default_prompt(enabled);
            send_ack(tx, "skip_default_prompt").await
        }
        ClientMessage::ClearHistory => {
            state.clear_history();
            send_ack(tx, "clear_history").await
        }
        ClientMessage::GetHistory => {
            let messages = state.history().to_vec();
            send_json(tx, &ServerMessage::History { messages }).await
        }
        ClientMessage::GetFile => {
            let content = state.file_context().unwrap_or_default().to_string();
            send_json(tx, &ServerMessage::File { content }).await
        }
    }
}

async fn handle_chat<S>(
    agent: &ChatAgent,
    state: &mut SessionState,
    content: &str,
    tx: &mut S
) -> Result<(), BoxError>
    where S: Sink<Message> + Unpin, S::Error: std::error::Error + Send + Sync + 'static
{
    let mut pending = match agent.begin(state, content).await {
        Ok(pending) => pending,
        Err(e) => {
            return send_error(tx, &e).await;
        }
    };
    send_json(tx, &ServerMessage::Processing).await?;

    while let Some(partial) = pending.next_partial().await {
        match partial {
            Ok(text) => {
                let part = ServerMessage::Partial { content: text.to_string() };
                send_json(tx, &part).await?;
            }
            Err(_) => {
                break;
            }
        }
    }

    match pending.finish(state).await {
        Ok(reply) => {
            let response = ServerMessage::Response {
                content: reply,
                timestamp: Utc::now().timestamp(),
            };
            send_json(tx, &response).await
        }
        Err(e) => send_error(tx, &e).await,
    }
}

/// Decodes and extracts an upload. Any error leaves the caller to drop the old file context.
fn load_upload(
    state: &mut SessionState,
    filename: &str,
    mime_type: Option<&str>,
    data: &str
) -> Result<usize, ChatError> {
    let bytes = BASE64.decode(data.trim()).map_err(|e| {
        ChatError::Extraction(format!("upload is not valid base64: {}", e))
    })?;
    let mime_type = match mime_type {
        Some(m) if !m.is_empty() => m,
        _ => extract::mime_for_path(Path::new(filename))?,
    };
    state.load_file(&bytes, mime_type)
}

async fn send_ack<S>(tx: &mut S, action: &str) -> Result<(), BoxError>
    where S: Sink<Message> + Unpin, S::Error: std::error::Error + Send + Sync + 'static
{
    send_json(tx, &ServerMessage::Ack { action: action.to_string() }).await
}

async fn send_error<S>(tx: &mut S, err: &ChatError) -> Result<(), BoxError>
    where S: Sink<Message> + Unpin, S::Error: std::error::Error + Send + Sync + 'static
{
    send_json(tx, &ServerMessage::Error { message: err.to_string() }).await
}

async fn send_json<S>(tx: &mut S, msg: &ServerMessage) -> Result<(), BoxError>
    where S: Sink<Message> + Unpin, S::Error: std::error::Error + Send + Sync + 'static
{
    let json = serde_json::to_string(msg)?;
    tx.send(Message::Text(json)).await.map_err(|e| Box::new(e) as BoxError)
}
