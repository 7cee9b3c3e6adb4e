use crate::errors::{ErrorSeverity, IntoErrorResponse};
use crate::events::{EventBus, GameEvent};
use memora_engine::cards::{Card, CardState};
use memora_engine::game::{Controller, Effect, Event, Phase, ScheduledTimer, Session};
use memora_engine::outcome::Outcome;
use memora_engine::rules::{Difficulty, RoundSetup, DEFAULT_PLAYERS};
use memora_engine::scoreboard::{ScoreEntry, Scoreboard};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::{Duration, Instant};
use thiserror::Error;
use uuid::Uuid;
use warp::http::StatusCode;

pub type SessionId = String;

const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Settings a page session was created with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub seed: Option<u64>,
    pub players: usize,
    pub difficulty: Difficulty,
    /// Names to submit right away; `None` leaves the session waiting for them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<Vec<String>>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: None,
            players: DEFAULT_PLAYERS,
            difficulty: Difficulty::default(),
            names: None,
        }
    }
}

impl GameConfig {
    pub fn setup(&self) -> RoundSetup {
        RoundSetup::new(self.players, self.difficulty)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session `{0}` was not found")]
    NotFound(SessionId),
    #[error("session `{0}` expired after inactivity")]
    Expired(SessionId),
    #[error("{message}")]
    DuplicateNames { names: Vec<String>, message: String },
    #[error("session storage lock poisoned")]
    StoragePoisoned,
}

impl IntoErrorResponse for SessionError {
    fn status_code(&self) -> StatusCode {
        match self {
            SessionError::NotFound(_) => StatusCode::NOT_FOUND,
            SessionError::Expired(_) => StatusCode::GONE,
            SessionError::DuplicateNames { .. } => StatusCode::BAD_REQUEST,
            SessionError::StoragePoisoned => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            SessionError::NotFound(_) => "session_not_found",
            SessionError::Expired(_) => "session_expired",
            SessionError::DuplicateNames { .. } => "duplicate_names",
            SessionError::StoragePoisoned => "storage_poisoned",
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            SessionError::DuplicateNames { names, .. } => {
                Some(serde_json::json!({ "names": names }))
            }
            _ => None,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            SessionError::StoragePoisoned => ErrorSeverity::Critical,
            _ => ErrorSeverity::Client,
        }
    }
}

/// What one input did: browser-facing events plus timers still to run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dispatch {
    pub events: Vec<GameEvent>,
    pub timers: Vec<(Duration, ScheduledTimer)>,
}

impl Dispatch {
    fn rejected_names(&self) -> Option<(Vec<String>, String)> {
        self.events.iter().find_map(|event| match event {
            GameEvent::NamesRejected { names, message, .. } => {
                Some((names.clone(), message.clone()))
            }
            _ => None,
        })
    }
}

/// Coarse page state reported to the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatePhase {
    /// Waiting on the setup form (after a reset)
    Setup,
    NamesRequired,
    Idle,
    Pending,
    Resolving,
    Complete,
}

impl From<Phase> for StatePhase {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Idle => StatePhase::Idle,
            Phase::Pending => StatePhase::Pending,
            Phase::Resolving => StatePhase::Resolving,
            Phase::Complete => StatePhase::Complete,
        }
    }
}

/// A card as the browser may see it. Face-down cards carry no symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardView {
    pub position: usize,
    pub state: CardState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl From<&Card> for CardView {
    fn from(card: &Card) -> Self {
        Self {
            position: card.position,
            state: card.state,
            symbol: (!card.is_hidden()).then(|| card.value.glyph().to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStateResponse {
    pub session_id: SessionId,
    pub phase: StatePhase,
    pub generation: u64,
    pub players: usize,
    pub difficulty: Difficulty,
    pub columns: usize,
    pub rows: usize,
    pub cards: Vec<CardView>,
    pub scoreboard: Vec<ScoreEntry>,
    pub current_player: Option<usize>,
    pub turn_indicator: Option<String>,
    pub theme: Option<String>,
    pub matched_pairs: usize,
    pub pair_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
}

impl GameStateResponse {
    fn waiting(session_id: &SessionId, phase: StatePhase, setup: RoundSetup, generation: u64) -> Self {
        let (columns, rows) = setup.difficulty.grid();
        Self {
            session_id: session_id.clone(),
            phase,
            generation,
            players: setup.players,
            difficulty: setup.difficulty,
            columns,
            rows,
            cards: Vec::new(),
            scoreboard: Vec::new(),
            current_player: None,
            turn_indicator: None,
            theme: None,
            matched_pairs: 0,
            pair_count: setup.difficulty.pair_count(),
            outcome: None,
        }
    }

    fn in_round(session_id: &SessionId, session: &Session) -> Self {
        let mut scoreboard = Scoreboard::new();
        scoreboard.sync(session);
        let (columns, rows) = session.difficulty().grid();
        Self {
            session_id: session_id.clone(),
            phase: session.phase().into(),
            generation: session.generation(),
            players: session.players().len(),
            difficulty: session.difficulty(),
            columns,
            rows,
            cards: session.cards().iter().map(CardView::from).collect(),
            scoreboard: scoreboard.entries().to_vec(),
            current_player: Some(session.current_player()),
            turn_indicator: scoreboard.turn_indicator().map(str::to_string),
            theme: scoreboard.theme_class(),
            matched_pairs: session.matched_pairs(),
            pair_count: session.pair_count(),
            outcome: session.is_complete().then(|| session.outcome()),
        }
    }
}

#[derive(Debug)]
pub struct SessionManager {
    sessions: RwLock<HashMap<SessionId, Arc<PageSession>>>,
    event_bus: Arc<EventBus>,
    session_ttl: Duration,
}

impl SessionManager {
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self::with_ttl(event_bus, DEFAULT_SESSION_TTL)
    }

    pub fn with_ttl(event_bus: Arc<EventBus>, ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            event_bus,
            session_ttl: ttl,
        }
    }

    /// Creates a page session and starts its first round. When `config.names`
    /// is set the names are submitted immediately; a collision rejects the
    /// whole request and nothing is stored.
    pub fn create_session(&self, config: GameConfig) -> Result<(SessionId, Dispatch), SessionError> {
        let id = Uuid::new_v4().to_string();
        let seed = config.seed.unwrap_or_else(|| Uuid::new_v4().as_u64_pair().0);

        tracing::info!(
            session_id = %id,
            players = config.players,
            difficulty = %config.difficulty,
            seed,
            "creating page session"
        );

        let setup = config.setup();
        let config = GameConfig {
            players: setup.players,
            difficulty: setup.difficulty,
            ..config
        };
        let session = Arc::new(PageSession::new(id.clone(), config.clone(), seed));
        let mut dispatch = session.apply(Event::Start(config.setup()))?;
        if let Some(names) = config.names {
            let submitted = session.apply(Event::SubmitNames(names))?;
            if let Some((names, message)) = submitted.rejected_names() {
                return Err(SessionError::DuplicateNames { names, message });
            }
            dispatch.events.extend(submitted.events);
            dispatch.timers.extend(submitted.timers);
        }

        self.sessions
            .write()
            .map_err(|_| SessionError::StoragePoisoned)?
            .insert(id.clone(), session);

        self.event_bus.broadcast_all(&id, &dispatch.events);
        Ok((id, dispatch))
    }

    pub fn get_session(&self, id: &SessionId) -> Result<Arc<PageSession>, SessionError> {
        let guard = self
            .sessions
            .read()
            .map_err(|_| SessionError::StoragePoisoned)?;
        guard
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.clone()))
    }

    /// Looks a session up for a user request: expired sessions are removed and
    /// reported, live ones have their inactivity clock reset.
    fn active(&self, id: &SessionId) -> Result<Arc<PageSession>, SessionError> {
        let session = self.get_session(id)?;
        if session.is_expired(self.session_ttl) {
            self.expire_session(id, "expired due to inactivity")?;
            return Err(SessionError::Expired(id.clone()));
        }
        session.touch();
        Ok(session)
    }

    pub fn state(&self, id: &SessionId) -> Result<GameStateResponse, SessionError> {
        self.active(id)?.state_snapshot()
    }

    pub fn config(&self, id: &SessionId) -> Result<GameConfig, SessionError> {
        Ok(self.get_session(id)?.config().clone())
    }

    /// Start trigger. Keeps the collected names when the player count matches.
    pub fn start(&self, id: &SessionId, setup: RoundSetup) -> Result<Dispatch, SessionError> {
        let session = self.active(id)?;
        tracing::debug!(
            session_id = %id,
            players = setup.players,
            difficulty = %setup.difficulty,
            "start requested"
        );
        self.run(id, &session, Event::Start(setup))
    }

    pub fn submit_names(&self, id: &SessionId, names: Vec<String>) -> Result<Dispatch, SessionError> {
        let session = self.active(id)?;
        let dispatch = self.run(id, &session, Event::SubmitNames(names))?;
        match dispatch.rejected_names() {
            Some((names, message)) => Err(SessionError::DuplicateNames { names, message }),
            None => Ok(dispatch),
        }
    }

    pub fn click(&self, id: &SessionId, position: usize) -> Result<Dispatch, SessionError> {
        let session = self.active(id)?;
        self.run(id, &session, Event::Click(position))
    }

    /// Reset / Play Again: clears the board and forgets the names.
    pub fn reset(&self, id: &SessionId) -> Result<Dispatch, SessionError> {
        let session = self.active(id)?;
        self.run(id, &session, Event::Reset)
    }

    /// Delivers an expired timer. Returns `None` when the session is gone;
    /// timers from an earlier round produce an empty dispatch.
    pub fn fire_timer(&self, id: &SessionId, timer: ScheduledTimer) -> Option<Dispatch> {
        let session = match self.get_session(id) {
            Ok(session) => session,
            Err(err) => {
                tracing::debug!(session_id = %id, error = %err, "timer outlived its session");
                return None;
            }
        };
        match self.run(id, &session, Event::Timer(timer)) {
            Ok(dispatch) => Some(dispatch),
            Err(err) => {
                tracing::error!(session_id = %id, error = %err, "failed to apply timer");
                self.event_bus.broadcast(
                    id,
                    GameEvent::Error {
                        session_id: id.clone(),
                        message: err.to_string(),
                    },
                );
                None
            }
        }
    }

    /// Sleeps each timer on the runtime, then feeds it back through
    /// [`SessionManager::fire_timer`], following up on whatever it schedules.
    pub fn spawn_timers(self: &Arc<Self>, id: &SessionId, timers: Vec<(Duration, ScheduledTimer)>) {
        for (after, timer) in timers {
            let sessions = Arc::clone(self);
            let id = id.clone();
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                if let Some(next) = sessions.fire_timer(&id, timer) {
                    sessions.spawn_timers(&id, next.timers);
                }
            });
        }
    }

    /// Applies `event` and publishes its events before the controller is
    /// released, so subscribers see each session's events in dispatch order.
    fn run(&self, id: &SessionId, session: &PageSession, event: Event) -> Result<Dispatch, SessionError> {
        let mut controller = session.controller()?;
        let dispatch = session.translate(&mut controller, event);
        self.event_bus.broadcast_all(id, &dispatch.events);
        Ok(dispatch)
    }

    pub fn delete_session(&self, id: &SessionId) -> Result<(), SessionError> {
        match self.remove_session(id, "terminated_by_request")? {
            Some(_) => Ok(()),
            None => Err(SessionError::NotFound(id.clone())),
        }
    }

    pub fn cleanup_expired_sessions(&self) {
        let mut expired = Vec::new();
        {
            let mut guard = match self.sessions.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.retain(|id, session| {
                if session.is_expired(self.session_ttl) {
                    expired.push(id.clone());
                    false
                } else {
                    true
                }
            });
        }

        for id in expired {
            tracing::info!(session_id = %id, "page session expired");
            self.end(&id, "expired");
        }
    }

    pub fn active_sessions(&self) -> Vec<SessionId> {
        match self.sessions.read() {
            Ok(guard) => guard.keys().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    fn expire_session(&self, id: &SessionId, reason: &str) -> Result<(), SessionError> {
        self.remove_session(id, reason).map(|_| ())
    }

    fn remove_session(
        &self,
        id: &SessionId,
        reason: &str,
    ) -> Result<Option<Arc<PageSession>>, SessionError> {
        let removed = self
            .sessions
            .write()
            .map_err(|_| SessionError::StoragePoisoned)?
            .remove(id);
        if removed.is_some() {
            tracing::info!(session_id = %id, reason, "page session removed");
            self.end(id, reason);
        }
        Ok(removed)
    }

    fn end(&self, id: &SessionId, reason: &str) {
        self.event_bus.broadcast(
            id,
            GameEvent::SessionEnded {
                session_id: id.clone(),
                reason: reason.to_string(),
            },
        );
        self.event_bus.drop_session(id);
    }
}

/// One browser page: a controller that lives across rounds.
#[derive(Debug)]
pub struct PageSession {
    id: SessionId,
    config: GameConfig,
    seed: u64,
    controller: Mutex<Controller>,
    created_at: Instant,
    last_active: Mutex<Instant>,
}

impl PageSession {
    fn new(id: SessionId, config: GameConfig, seed: u64) -> Self {
        let now = Instant::now();
        Self {
            id,
            config,
            seed,
            controller: Mutex::new(Controller::new(seed)),
            created_at: now,
            last_active: Mutex::new(now),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    fn controller(&self) -> Result<MutexGuard<'_, Controller>, SessionError> {
        self.controller
            .lock()
            .map_err(|_| SessionError::StoragePoisoned)
    }

    fn apply(&self, event: Event) -> Result<Dispatch, SessionError> {
        let mut controller = self.controller()?;
        Ok(self.translate(&mut controller, event))
    }

    fn translate(&self, controller: &mut Controller, event: Event) -> Dispatch {
        let effects = controller.dispatch(event);

        let mut dispatch = Dispatch::default();
        for effect in &effects {
            match effect {
                Effect::Schedule { after, timer } => dispatch.timers.push((*after, *timer)),
                other => dispatch.events.extend(GameEvent::from_effect(
                    &self.id,
                    other,
                    controller.session(),
                )),
            }
        }
        dispatch
    }

    fn state_snapshot(&self) -> Result<GameStateResponse, SessionError> {
        let controller = self.controller()?;
        if let Some(setup) = controller.pending_setup() {
            return Ok(GameStateResponse::waiting(
                &self.id,
                StatePhase::NamesRequired,
                setup,
                controller.generation(),
            ));
        }
        Ok(match controller.session() {
            Some(session) => GameStateResponse::in_round(&self.id, session),
            None => GameStateResponse::waiting(
                &self.id,
                StatePhase::Setup,
                self.config.setup(),
                controller.generation(),
            ),
        })
    }

    fn touch(&self) {
        if let Ok(mut guard) = self.last_active.lock() {
            *guard = Instant::now();
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        match self.last_active.lock() {
            Ok(guard) => guard.elapsed() > ttl,
            Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memora_engine::deck::Deck;
    use std::collections::HashSet;
    use std::thread;

    fn manager() -> SessionManager {
        SessionManager::with_ttl(Arc::new(EventBus::new()), Duration::from_secs(60))
    }

    fn named(seed: u64) -> GameConfig {
        GameConfig {
            seed: Some(seed),
            players: 2,
            difficulty: Difficulty::Easy,
            names: Some(vec!["ann".into(), "ben".into()]),
        }
    }

    fn pair_and_miss(seed: u64) -> ((usize, usize), (usize, usize)) {
        let cards = Deck::new_with_seed(seed).deal(Difficulty::Easy);
        let mate = cards
            .iter()
            .skip(1)
            .position(|c| c.value == cards[0].value)
            .map(|i| i + 1)
            .expect("pair exists");
        let miss = (1..cards.len())
            .find(|&i| cards[i].value != cards[0].value)
            .expect("different symbol");
        ((0, mate), (0, miss))
    }

    #[test]
    fn create_without_names_waits_for_them() {
        let manager = manager();
        let config = GameConfig {
            names: None,
            ..named(1)
        };
        let (id, dispatch) = manager.create_session(config).expect("create");

        assert_eq!(dispatch.events.len(), 1);
        assert_eq!(dispatch.events[0].kind(), "names_required");

        let state = manager.state(&id).expect("state");
        assert_eq!(state.phase, StatePhase::NamesRequired);
        assert_eq!(state.players, 2);
        assert!(state.cards.is_empty());
    }

    #[test]
    fn create_with_names_deals_hidden_board() {
        let manager = manager();
        let (id, _) = manager.create_session(named(1)).expect("create");

        let state = manager.state(&id).expect("state");
        assert_eq!(state.phase, StatePhase::Idle);
        assert_eq!(state.cards.len(), 16);
        assert!(state.cards.iter().all(|c| c.symbol.is_none()));
        assert_eq!(state.scoreboard[0].name, "Ann");
        assert!(state.scoreboard[0].active);
        assert_eq!(state.turn_indicator.as_deref(), Some("Ann's turn"));
        assert_eq!(state.theme.as_deref(), Some("player-1"));
    }

    #[test]
    fn duplicate_names_on_create_store_nothing() {
        let manager = manager();
        let config = GameConfig {
            names: Some(vec!["Ann".into(), "ANN".into()]),
            ..named(1)
        };
        match manager.create_session(config) {
            Err(SessionError::DuplicateNames { names, .. }) => assert_eq!(names, vec!["ann"]),
            other => panic!("expected duplicate names, got {other:?}"),
        }
        assert!(manager.active_sessions().is_empty());
    }

    #[test]
    fn duplicate_submission_maps_to_bad_request() {
        let manager = manager();
        let (id, _) = manager
            .create_session(GameConfig { names: None, ..named(1) })
            .expect("create");

        let err = manager
            .submit_names(&id, vec!["Zoe".into(), "zoe".into()])
            .expect_err("duplicates rejected");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "duplicate_names");
        assert_eq!(err.error_details().expect("details")["names"][0], "zoe");
        assert_eq!(manager.state(&id).expect("state").phase, StatePhase::NamesRequired);
    }

    #[test]
    fn clicks_reveal_only_flipped_cards() {
        let manager = manager();
        let (id, _) = manager.create_session(named(9)).expect("create");
        let (_, (first, miss)) = pair_and_miss(9);

        manager.click(&id, first).expect("click");
        let dispatch = manager.click(&id, miss).expect("click");
        assert_eq!(dispatch.timers.len(), 1);
        assert_eq!(dispatch.timers[0].0, Duration::from_millis(800));

        let state = manager.state(&id).expect("state");
        assert_eq!(state.phase, StatePhase::Resolving);
        let revealed: Vec<usize> = state
            .cards
            .iter()
            .filter(|c| c.symbol.is_some())
            .map(|c| c.position)
            .collect();
        assert_eq!(revealed, vec![first, miss]);
    }

    #[test]
    fn mismatch_timer_passes_the_turn() {
        let manager = manager();
        let (id, _) = manager.create_session(named(9)).expect("create");
        let (_, (first, miss)) = pair_and_miss(9);

        manager.click(&id, first).expect("click");
        let dispatch = manager.click(&id, miss).expect("click");
        let fired = manager
            .fire_timer(&id, dispatch.timers[0].1)
            .expect("session alive");

        let kinds: Vec<&str> = fired.events.iter().map(GameEvent::kind).collect();
        assert_eq!(kinds, vec!["cards_hidden", "turn_changed", "turn_announced"]);
        assert_eq!(manager.state(&id).expect("state").current_player, Some(1));
    }

    #[test]
    fn match_chain_schedules_follow_up() {
        let manager = manager();
        let (id, _) = manager.create_session(named(4)).expect("create");
        let ((a, b), _) = pair_and_miss(4);

        manager.click(&id, a).expect("click");
        let dispatch = manager.click(&id, b).expect("click");
        let reveal = manager.fire_timer(&id, dispatch.timers[0].1).expect("alive");
        assert_eq!(reveal.timers[0].0, Duration::from_millis(350));
        let clear = manager.fire_timer(&id, reveal.timers[0].1).expect("alive");
        assert_eq!(clear.events[0].kind(), "cards_vacated");

        let state = manager.state(&id).expect("state");
        assert_eq!(state.cards[a].state, CardState::Vacant);
        assert_eq!(state.scoreboard[0].score, 1);
        assert_eq!(state.current_player, Some(0));
    }

    #[test]
    fn reset_forgets_names_and_stales_timers() {
        let manager = manager();
        let (id, _) = manager.create_session(named(9)).expect("create");
        let (_, (first, miss)) = pair_and_miss(9);
        manager.click(&id, first).expect("click");
        let pending = manager.click(&id, miss).expect("click").timers[0].1;

        let dispatch = manager.reset(&id).expect("reset");
        assert_eq!(dispatch.events[0].kind(), "board_cleared");
        assert_eq!(manager.state(&id).expect("state").phase, StatePhase::Setup);

        let start = manager
            .start(&id, RoundSetup::new(2, Difficulty::Easy))
            .expect("start");
        assert_eq!(start.events[0].kind(), "names_required");

        let fired = manager.fire_timer(&id, pending).expect("alive");
        assert!(fired.events.is_empty());
    }

    #[test]
    fn deleted_session_ignores_timers() {
        let manager = manager();
        let (id, _) = manager.create_session(named(9)).expect("create");
        let (_, (first, miss)) = pair_and_miss(9);
        manager.click(&id, first).expect("click");
        let pending = manager.click(&id, miss).expect("click").timers[0].1;

        manager.delete_session(&id).expect("delete");
        assert!(manager.fire_timer(&id, pending).is_none());
        assert!(matches!(
            manager.delete_session(&id),
            Err(SessionError::NotFound(_))
        ));
    }

    #[test]
    fn expired_session_is_reported_gone() {
        let manager = SessionManager::with_ttl(Arc::new(EventBus::new()), Duration::from_millis(5));
        let (id, _) = manager.create_session(named(1)).expect("create");
        thread::sleep(Duration::from_millis(20));

        match manager.state(&id) {
            Err(err @ SessionError::Expired(_)) => {
                assert_eq!(err.status_code(), StatusCode::GONE)
            }
            other => panic!("expected expiry, got {other:?}"),
        }
        assert!(matches!(manager.state(&id), Err(SessionError::NotFound(_))));
    }

    #[test]
    fn cleanup_expired_sessions_notifies_subscribers() {
        let bus = Arc::new(EventBus::new());
        let manager = SessionManager::with_ttl(Arc::clone(&bus), Duration::from_millis(5));
        let (id, _) = manager.create_session(named(1)).expect("create");
        let mut sub = bus.subscribe(id.clone());
        thread::sleep(Duration::from_millis(20));

        manager.cleanup_expired_sessions();

        assert!(manager.active_sessions().is_empty());
        match sub.receiver.try_recv() {
            Ok(GameEvent::SessionEnded { reason, .. }) => assert_eq!(reason, "expired"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn concurrent_clicks_flip_at_most_two_cards() {
        let manager = Arc::new(manager());
        let (id, _) = manager.create_session(named(11)).expect("create");
        let mut subscription = manager.event_bus().subscribe(id.clone());

        // One card per symbol, so no two of these can match.
        let cards = Deck::new_with_seed(11).deal(Difficulty::Easy);
        let mut seen = HashSet::new();
        let distinct: Vec<usize> = cards
            .iter()
            .filter(|c| seen.insert(c.value))
            .map(|c| c.position)
            .collect();

        let handles: Vec<_> = distinct
            .into_iter()
            .map(|position| {
                let manager = Arc::clone(&manager);
                let id = id.clone();
                thread::spawn(move || manager.click(&id, position).expect("click").events)
            })
            .collect();

        let mut flipped = HashSet::new();
        for handle in handles {
            for event in handle.join().expect("join thread") {
                if let GameEvent::CardFlipped { position, .. } = event {
                    assert!(flipped.insert(position), "card {position} flipped twice");
                }
            }
        }
        assert_eq!(flipped.len(), 2);

        let state = manager.state(&id).expect("state");
        let face_up = state.cards.iter().filter(|c| c.symbol.is_some()).count();
        assert_eq!(face_up, 2);

        let mut kinds = Vec::new();
        while let Ok(event) = subscription.receiver().try_recv() {
            kinds.push(event.kind());
        }
        assert_eq!(kinds, vec!["card_flipped"; 2]);
    }

    #[test]
    fn oversized_player_count_is_normalized() {
        let manager = manager();
        let config = GameConfig {
            seed: Some(1),
            players: usize::MAX,
            difficulty: Difficulty::Easy,
            names: Some(Vec::new()),
        };
        let (id, dispatch) = manager.create_session(config).expect("create");
        assert!(dispatch.events.iter().any(|e| e.kind() == "round_started"));

        let state = manager.state(&id).expect("state");
        assert_eq!(state.players, DEFAULT_PLAYERS);
        assert_eq!(manager.config(&id).expect("config").players, DEFAULT_PLAYERS);
    }

    #[test]
    fn timer_on_poisoned_session_reports_error_event() {
        let manager = manager();
        let (id, _) = manager.create_session(named(9)).expect("create");
        let (_, (first, miss)) = pair_and_miss(9);
        manager.click(&id, first).expect("click");
        let (_, timer) = manager.click(&id, miss).expect("click").timers[0];

        let session = manager.get_session(&id).expect("session");
        let poisoner = Arc::clone(&session);
        let _ = thread::spawn(move || {
            let _guard = poisoner.controller.lock();
            panic!("poison the controller");
        })
        .join();

        let mut subscription = manager.event_bus().subscribe(id.clone());
        assert!(manager.fire_timer(&id, timer).is_none());

        match subscription.receiver().try_recv() {
            Ok(GameEvent::Error { message, .. }) => assert!(message.contains("poisoned")),
            other => panic!("expected error event, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_timers_run_on_the_runtime() {
        let manager = Arc::new(manager());
        let (id, _) = manager.create_session(named(9)).expect("create");
        let (_, (first, miss)) = pair_and_miss(9);

        manager.click(&id, first).expect("click");
        let dispatch = manager.click(&id, miss).expect("click");
        manager.spawn_timers(&id, dispatch.timers);

        tokio::time::sleep(Duration::from_millis(900)).await;
        tokio::task::yield_now().await;
        assert_eq!(manager.state(&id).expect("state").current_player, Some(1));
    }
}
