//! REST and WebSocket surface.
//!
//! Thin by design: handlers deserialize a request, call one `GameService`
//! method, and serialize the result. No game logic lives here.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use tracing::debug;

use concordat_protocol::{GameDate, UnitType};

use crate::game::{GameService, ServiceError};
use crate::notify::Notification;

type AppState = Arc<GameService>;

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Store(_) | ServiceError::Generation(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn router(service: AppState) -> Router {
    Router::new()
        .route("/api/ping", get(ping))
        .route("/api/health", get(health))
        .route("/api/nations", get(list_nations))
        .route("/api/nations/{code}", get(get_nation))
        .route("/api/game/new", post(create_game))
        .route("/api/game/saves", get(list_games))
        .route("/api/game/{save_id}", get(load_game).delete(delete_game))
        .route("/api/game/{save_id}/rename", post(rename_game))
        .route("/api/game/{save_id}/advance", post(advance_time))
        .route(
            "/api/game/{save_id}/actions",
            get(list_actions).post(submit_action),
        )
        .route("/api/game/{save_id}/actions/pending", get(pending_actions))
        .route("/api/game/{save_id}/actions/current", get(current_actions))
        .route(
            "/api/game/{save_id}/actions/{action_id}",
            delete(delete_action),
        )
        .route("/api/game/{save_id}/units", get(list_units).post(create_unit))
        .route("/api/game/{save_id}/units/{unit_id}", get(get_unit))
        .route("/api/game/{save_id}/units/{unit_id}/move", post(move_unit))
        .route("/api/game/{save_id}/advisor", post(ask_advisor))
        .route("/api/game/{save_id}/advisor/summary", get(advisor_summary))
        .route("/api/game/{save_id}/advisor/strategic", get(advisor_strategy))
        .route(
            "/api/game/{save_id}/advisor/suggestions",
            get(advisor_suggestions),
        )
        .route("/api/game/{save_id}/events", get(recent_events))
        .route("/api/game/{save_id}/events/important", get(important_events))
        .route("/api/game/{save_id}/events/stats", get(event_stats))
        .route("/api/game/{save_id}/events/turn/{turn}", get(events_by_turn))
        .route(
            "/api/game/{save_id}/events/type/{event_type}",
            get(events_by_type),
        )
        .route(
            "/api/game/{save_id}/events/nation/{code}",
            get(events_by_nation),
        )
        .route("/api/game/{save_id}/events/{event_id}", get(get_event))
        .route("/api/game/{save_id}/chats", get(list_chats).post(start_chat))
        .route("/api/game/{save_id}/chats/{chat_id}", get(chat_detail))
        .route(
            "/api/game/{save_id}/chats/{chat_id}/messages",
            post(post_message),
        )
        .route("/api/game/{save_id}/chats/{chat_id}/close", post(close_chat))
        .route("/api/game/{save_id}/partners", get(available_partners))
        .route("/ws", get(ws_upgrade))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn ping() -> &'static str {
    "pong"
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

// ---- nations ----

async fn list_nations(State(service): State<AppState>) -> impl IntoResponse {
    Json(service.nations())
}

async fn get_nation(
    State(service): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.nation(&code)?))
}

// ---- save lifecycle ----

#[derive(Deserialize)]
struct CreateGameRequest {
    nation_code: String,
    #[serde(default)]
    start_date: Option<GameDate>,
}

async fn create_game(
    State(service): State<AppState>,
    Json(request): Json<CreateGameRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let save = service
        .create_game(&request.nation_code, request.start_date)
        .await?;
    Ok((StatusCode::CREATED, Json(save)))
}

async fn list_games(State(service): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.list_games()?))
}

async fn load_game(
    State(service): State<AppState>,
    Path(save_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.load_game(&save_id)?))
}

async fn delete_game(
    State(service): State<AppState>,
    Path(save_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    service.delete_game(&save_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct RenameRequest {
    name: String,
}

async fn rename_game(
    State(service): State<AppState>,
    Path(save_id): Path<String>,
    Json(request): Json<RenameRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    service.rename_game(&save_id, &request.name).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- turn advancement ----

#[derive(Deserialize)]
struct AdvanceRequest {
    time_jump: String,
}

async fn advance_time(
    State(service): State<AppState>,
    Path(save_id): Path<String>,
    Json(request): Json<AdvanceRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.advance_time(&save_id, &request.time_jump).await?))
}

// ---- actions ----

#[derive(Deserialize)]
struct SubmitActionRequest {
    action_text: String,
    #[serde(default)]
    action_type: Option<String>,
}

async fn submit_action(
    State(service): State<AppState>,
    Path(save_id): Path<String>,
    Json(request): Json<SubmitActionRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let action = service
        .submit_action(&save_id, &request.action_text, request.action_type.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(action)))
}

async fn list_actions(
    State(service): State<AppState>,
    Path(save_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.actions(&save_id)?))
}

async fn pending_actions(
    State(service): State<AppState>,
    Path(save_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.pending_actions(&save_id)?))
}

async fn current_actions(
    State(service): State<AppState>,
    Path(save_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.current_turn_actions(&save_id)?))
}

async fn delete_action(
    State(service): State<AppState>,
    Path((save_id, action_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ServiceError> {
    service.delete_action(&save_id, &action_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- units ----

#[derive(Deserialize)]
struct CreateUnitRequest {
    name: String,
    unit_type: UnitType,
    nation_code: String,
    region_id: String,
    #[serde(default = "default_strength")]
    strength: i32,
    #[serde(default)]
    centroid: Option<[f64; 2]>,
}

fn default_strength() -> i32 {
    100
}

async fn create_unit(
    State(service): State<AppState>,
    Path(save_id): Path<String>,
    Json(request): Json<CreateUnitRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let unit = service
        .create_unit(
            &save_id,
            &request.name,
            request.unit_type,
            &request.nation_code,
            &request.region_id,
            request.strength,
            request.centroid,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(unit)))
}

#[derive(Deserialize)]
struct UnitsQuery {
    #[serde(default)]
    nation: Option<String>,
    #[serde(default)]
    region: Option<String>,
}

async fn list_units(
    State(service): State<AppState>,
    Path(save_id): Path<String>,
    Query(query): Query<UnitsQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.units(
        &save_id,
        query.nation.as_deref(),
        query.region.as_deref(),
    )?))
}

async fn get_unit(
    State(service): State<AppState>,
    Path((save_id, unit_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.unit(&save_id, &unit_id)?))
}

#[derive(Deserialize)]
struct MoveUnitRequest {
    region_id: String,
    #[serde(default)]
    centroid: Option<[f64; 2]>,
}

async fn move_unit(
    State(service): State<AppState>,
    Path((save_id, unit_id)): Path<(String, String)>,
    Json(request): Json<MoveUnitRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let unit = service
        .move_unit(&save_id, &unit_id, &request.region_id, request.centroid)
        .await?;
    Ok(Json(unit))
}

// ---- advisor ----

#[derive(Deserialize)]
struct AdvisorRequest {
    question: String,
}

async fn ask_advisor(
    State(service): State<AppState>,
    Path(save_id): Path<String>,
    Json(request): Json<AdvisorRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let reply = service.ask_advisor(&save_id, &request.question).await?;
    Ok(Json(json!({ "reply": reply })))
}

async fn advisor_summary(
    State(service): State<AppState>,
    Path(save_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(json!({ "reply": service.advisor_summary(&save_id).await? })))
}

#[derive(Deserialize)]
struct StrategyQuery {
    #[serde(default)]
    focus: Option<String>,
}

async fn advisor_strategy(
    State(service): State<AppState>,
    Path(save_id): Path<String>,
    Query(query): Query<StrategyQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let reply = service
        .advisor_strategy(&save_id, query.focus.as_deref())
        .await?;
    Ok(Json(json!({ "reply": reply })))
}

async fn advisor_suggestions(
    State(service): State<AppState>,
    Path(save_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(json!({ "reply": service.advisor_suggestions(&save_id).await? })))
}

// ---- events ----

#[derive(Deserialize)]
struct EventsQuery {
    #[serde(default = "default_event_limit")]
    limit: usize,
}

fn default_event_limit() -> usize {
    20
}

async fn recent_events(
    State(service): State<AppState>,
    Path(save_id): Path<String>,
    Query(query): Query<EventsQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.recent_events(&save_id, query.limit)?))
}

async fn events_by_turn(
    State(service): State<AppState>,
    Path((save_id, turn)): Path<(String, u32)>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.events_by_turn(&save_id, turn)?))
}

async fn events_by_type(
    State(service): State<AppState>,
    Path((save_id, event_type)): Path<(String, String)>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.events_by_type(&save_id, &event_type)?))
}

async fn events_by_nation(
    State(service): State<AppState>,
    Path((save_id, code)): Path<(String, String)>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.events_by_nation(&save_id, &code)?))
}

async fn important_events(
    State(service): State<AppState>,
    Path(save_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.important_events(&save_id)?))
}

async fn event_stats(
    State(service): State<AppState>,
    Path(save_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.event_stats(&save_id)?))
}

async fn get_event(
    State(service): State<AppState>,
    Path((save_id, event_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.event(&save_id, &event_id)?))
}

// ---- diplomacy ----

#[derive(Deserialize)]
struct StartChatRequest {
    participants: Vec<String>,
    #[serde(default)]
    topic: Option<String>,
}

async fn start_chat(
    State(service): State<AppState>,
    Path(save_id): Path<String>,
    Json(request): Json<StartChatRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let chat = service
        .start_chat(&save_id, &request.participants, request.topic.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(chat)))
}

async fn list_chats(
    State(service): State<AppState>,
    Path(save_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.list_chats(&save_id)?))
}

async fn chat_detail(
    State(service): State<AppState>,
    Path((save_id, chat_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.chat_detail(&save_id, &chat_id)?))
}

#[derive(Deserialize)]
struct PostMessageRequest {
    message: String,
}

async fn post_message(
    State(service): State<AppState>,
    Path((save_id, chat_id)): Path<(String, String)>,
    Json(request): Json<PostMessageRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let replies = service
        .post_message(&save_id, &chat_id, &request.message)
        .await?;
    Ok(Json(replies))
}

async fn close_chat(
    State(service): State<AppState>,
    Path((save_id, chat_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ServiceError> {
    service.close_chat(&save_id, &chat_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn available_partners(
    State(service): State<AppState>,
    Path(save_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(service.available_partners(&save_id)?))
}

// ---- websocket ----

async fn ws_upgrade(ws: WebSocketUpgrade, State(service): State<AppState>) -> Response {
    let receiver = service.notifier().subscribe();
    ws.on_upgrade(move |socket| stream_notifications(socket, receiver))
}

/// Forward every notification as a JSON text frame until the client goes
/// away. Inbound frames are drained and ignored; lagged receivers skip
/// ahead rather than disconnect.
async fn stream_notifications(socket: WebSocket, mut receiver: broadcast::Receiver<Notification>) {
    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            notification = receiver.recv() => match notification {
                Ok(notification) => {
                    let Ok(text) = serde_json::to_string(&notification) else {
                        continue;
                    };
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        debug!("websocket client disconnected");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "websocket receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            inbound = stream.next() => match inbound {
                Some(Ok(_)) => {}
                _ => break,
            },
        }
    }
}
