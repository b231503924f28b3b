//! Oeffentlicher HTTP/WebSocket-Endpunkt
//!
//! `GET /ws` wertet die Verbindung zum WebSocket auf und haengt sie in den
//! Session-Kern ein. `GET /health` ist der uebliche Health-Check.

use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use botschaft_core::SessionId;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::kern::SessionKernHandle;
use crate::verbindung;

/// Axum-State des oeffentlichen Routers
#[derive(Clone)]
struct WsState {
    kern: SessionKernHandle,
}

/// Query-Parameter der WebSocket-Aufwertung
#[derive(Debug, Deserialize)]
struct WsParams {
    /// Session-Schluessel des Frontends; fehlt er, wird einer erzeugt
    sid: Option<String>,
}

/// Baut den oeffentlichen Router um ein Handle auf den Session-Kern
pub fn oeffentlicher_router(kern: SessionKernHandle) -> Router {
    Router::new()
        .route("/ws", get(ws_aufwertung))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(WsState { kern })
}

/// GET /ws – HTTP-zu-WebSocket-Aufwertung
async fn ws_aufwertung(
    State(state): State<WsState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let id = params
        .sid
        .map(SessionId::aus)
        .unwrap_or_else(SessionId::zufaellig);

    ws.on_upgrade(move |socket| verbindung::verarbeiten(socket, state.kern, id))
}

/// GET /health – Health-Check-Endpunkt
async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}
