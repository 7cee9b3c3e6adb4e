use crate::errors::IntoErrorResponse;
use crate::events::GameEvent;
use crate::session::{
    Dispatch, GameConfig, GameStateResponse, SessionError, SessionId, SessionManager,
};
use memora_engine::rules::{parse_player_count, Difficulty, RoundSetup};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reply::{self, Response};
use warp::Reply;

/// A form field that may arrive as a JSON number or as the raw input text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    Number(u64),
    Text(String),
}

impl FormValue {
    fn player_count(&self) -> usize {
        match self {
            FormValue::Number(n) => usize::try_from(*n).unwrap_or(0),
            FormValue::Text(text) => parse_player_count(text),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    pub players: Option<FormValue>,
    pub difficulty: Option<String>,
    pub names: Option<Vec<String>>,
    pub seed: Option<u64>,
}

impl CreateSessionRequest {
    fn into_config(self) -> GameConfig {
        let defaults = GameConfig::default();
        let setup = RoundSetup::new(
            self.players
                .map(|p| p.player_count())
                .unwrap_or(defaults.players),
            self.difficulty
                .as_deref()
                .map(Difficulty::parse_or_default)
                .unwrap_or(defaults.difficulty),
        );
        GameConfig {
            seed: self.seed,
            players: setup.players,
            difficulty: setup.difficulty,
            names: self.names,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StartRequest {
    pub players: Option<FormValue>,
    pub difficulty: Option<String>,
}

impl StartRequest {
    /// Missing fields fall back to what the session was created with.
    fn setup(&self, config: &GameConfig) -> RoundSetup {
        RoundSetup::new(
            self.players
                .as_ref()
                .map(FormValue::player_count)
                .unwrap_or(config.players),
            self.difficulty
                .as_deref()
                .map(Difficulty::parse_or_default)
                .unwrap_or(config.difficulty),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct NamesRequest {
    pub names: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: SessionId,
    pub config: GameConfig,
    pub state: GameStateResponse,
}

/// Events produced by one request and the state they left behind.
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub session_id: SessionId,
    pub events: Vec<GameEvent>,
    pub state: GameStateResponse,
}

/// `POST /api/sessions`
///
/// Creates a page session and presses Start with the submitted setup. Without
/// `names` the returned state is in the `names_required` phase.
///
/// ```json
/// { "players": 3, "difficulty": "hard", "names": ["ann", "ben", ""], "seed": 42 }
/// ```
///
/// Responds `201 Created` with a [`SessionResponse`], or `400 duplicate_names`.
pub async fn create_session(
    sessions: Arc<SessionManager>,
    request: CreateSessionRequest,
) -> Response {
    let config = request.into_config();
    let result = sessions
        .create_session(config)
        .and_then(|(session_id, dispatch)| {
            sessions.spawn_timers(&session_id, dispatch.timers);
            assemble_session_response(&sessions, &session_id)
        });
    match result {
        Ok(response) => success_response(StatusCode::CREATED, response),
        Err(err) => session_error(err),
    }
}

/// `GET /api/sessions/{id}`: configuration plus current state.
pub async fn get_session(sessions: Arc<SessionManager>, session_id: SessionId) -> Response {
    match assemble_session_response(&sessions, &session_id) {
        Ok(response) => success_response(StatusCode::OK, response),
        Err(err) => session_error(err),
    }
}

pub async fn get_session_state(sessions: Arc<SessionManager>, session_id: SessionId) -> Response {
    match sessions.state(&session_id) {
        Ok(state) => success_response(StatusCode::OK, state),
        Err(err) => session_error(err),
    }
}

/// `POST /api/sessions/{id}/start`
///
/// Deals a new round. Collected names are reused when the player count is
/// unchanged; otherwise the session asks for names again.
pub async fn start_round(
    sessions: Arc<SessionManager>,
    session_id: SessionId,
    request: StartRequest,
) -> Response {
    let result = sessions
        .config(&session_id)
        .and_then(|config| sessions.start(&session_id, request.setup(&config)));
    respond(&sessions, &session_id, StatusCode::OK, result)
}

/// `POST /api/sessions/{id}/names`
///
/// Names are trimmed, blanks become `Player N`, and case-insensitive
/// duplicates are refused with `400 duplicate_names` listing the offenders in
/// `details.names`.
pub async fn submit_names(
    sessions: Arc<SessionManager>,
    session_id: SessionId,
    request: NamesRequest,
) -> Response {
    let result = sessions.submit_names(&session_id, request.names);
    respond(&sessions, &session_id, StatusCode::OK, result)
}

/// `POST /api/sessions/{id}/cards/{position}`
///
/// Always `202 Accepted` for a live session: illegal clicks simply produce no
/// events. Follow-up transitions arrive on the event stream.
pub async fn click_card(
    sessions: Arc<SessionManager>,
    session_id: SessionId,
    position: usize,
) -> Response {
    let result = sessions.click(&session_id, position);
    respond(&sessions, &session_id, StatusCode::ACCEPTED, result)
}

/// `POST /api/sessions/{id}/reset`: Reset and Play Again.
pub async fn reset_round(sessions: Arc<SessionManager>, session_id: SessionId) -> Response {
    let result = sessions.reset(&session_id);
    respond(&sessions, &session_id, StatusCode::OK, result)
}

/// `DELETE /api/sessions/{id}`: `204 No Content`, or `404` if unknown.
pub async fn delete_session(sessions: Arc<SessionManager>, session_id: SessionId) -> Response {
    match sessions.delete_session(&session_id) {
        Ok(()) => reply::with_status(warp::reply(), StatusCode::NO_CONTENT).into_response(),
        Err(err) => session_error(err),
    }
}

fn respond(
    sessions: &Arc<SessionManager>,
    session_id: &SessionId,
    status: StatusCode,
    result: Result<Dispatch, SessionError>,
) -> Response {
    let result = result.and_then(|dispatch| {
        sessions.spawn_timers(session_id, dispatch.timers);
        Ok(ActionResponse {
            session_id: session_id.clone(),
            events: dispatch.events,
            state: sessions.state(session_id)?,
        })
    });
    match result {
        Ok(body) => success_response(status, body),
        Err(err) => session_error(err),
    }
}

fn assemble_session_response(
    sessions: &SessionManager,
    session_id: &SessionId,
) -> Result<SessionResponse, SessionError> {
    let state = sessions.state(session_id)?;
    let config = sessions.config(session_id)?;
    Ok(SessionResponse {
        session_id: session_id.clone(),
        config,
        state,
    })
}

fn success_response<T>(status: StatusCode, body: T) -> Response
where
    T: Serialize,
{
    reply::with_status(reply::json(&body), status).into_response()
}

fn session_error(err: SessionError) -> Response {
    err.into_http_response()
}
