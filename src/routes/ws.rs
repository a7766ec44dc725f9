//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. Messages on one socket are handled one at a time,
//! so a client never has two generations in flight.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug, warn};

use crate::error::GenerationError;
use crate::logic::{generate, GeneratedBundle};
use crate::protocol::{parse_level, to_out, ws_source_input, ClientWsMessage, ServerWsMessage, WsFileIn};
use crate::state::AppState;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "pedagen_backend", "WebSocket upgrade requested");
  let max = ws_message_limit(state.max_upload_bytes);
  ws.max_message_size(max)
    .max_frame_size(max)
    .on_upgrade(move |socket| handle_ws(socket, state))
}

/// Base64 inflates uploads by 4/3; leave headroom for the JSON envelope.
fn ws_message_limit(max_upload_bytes: usize) -> usize {
  (max_upload_bytes / 3).saturating_mul(4).saturating_add(64 * 1024)
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "pedagen_backend", "WebSocket connected");
  loop {
    let msg = match socket.recv().await {
      Some(Ok(msg)) => msg,
      Some(Err(e)) => {
        warn!(target: "pedagen_backend", error = %e, "WS receive error");
        break;
      }
      None => break,
    };
    match msg {
      Message::Text(txt) => {
        let incoming = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(m) => m,
          Err(e) => {
            let reply = ServerWsMessage::Error { message: format!("Invalid JSON: {}", e), kind: "bad_request" };
            if !send(&mut socket, &reply).await { break; }
            continue;
          }
        };
        debug!(target: "pedagen_backend", kind = incoming_kind(&incoming), "WS received");

        if matches!(incoming, ClientWsMessage::Generate { .. }) && !send(&mut socket, &ServerWsMessage::Generating).await {
          break;
        }
        let reply = handle_client_ws(incoming, &state).await;
        if !send(&mut socket, &reply).await { break; }
      }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "pedagen_backend", "WebSocket disconnected");
}

fn incoming_kind(msg: &ClientWsMessage) -> &'static str {
  match msg {
    ClientWsMessage::Ping => "ping",
    ClientWsMessage::Generate { .. } => "generate",
  }
}

/// Serialize and send; false when the socket is gone.
async fn send(socket: &mut WebSocket, msg: &ServerWsMessage) -> bool {
  let out = serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  });
  match socket.send(Message::Text(out)).await {
    Ok(()) => true,
    Err(e) => {
      error!(target: "pedagen_backend", error = %e, "WS send error");
      false
    }
  }
}

#[instrument(level = "info", skip_all)]
pub(crate) async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::Generate { text, level, files, markdown } => {
      match run_generate(state, text, level, files).await {
        Ok(bundle) => {
          info!(target: "generation", id = %bundle.id, level = %bundle.level, "WS generate served");
          ServerWsMessage::Resources { out: to_out(bundle, markdown) }
        }
        Err(e) => e.into(),
      }
    }
  }
}

async fn run_generate(
  state: &AppState,
  text: String,
  level: Option<String>,
  files: Vec<WsFileIn>,
) -> Result<GeneratedBundle, GenerationError> {
  let level = parse_level(level.as_deref())?;
  let input = ws_source_input(text, files)?;
  if !input.has_content() {
    return Err(GenerationError::EmptyInput);
  }
  let model = state.model()?;
  generate(model, &state.prompts, input, level).await
}
