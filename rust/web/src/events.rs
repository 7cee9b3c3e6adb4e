use crate::session::SessionId;
use memora_engine::game::{Effect, Session};
use memora_engine::outcome::Outcome;
use memora_engine::player::Player;
use memora_engine::rules::Difficulty;
use memora_engine::scoreboard::TurnAnnouncement;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::mpsc;

// Slow subscribers lose events once their buffer fills
const EVENT_CHANNEL_BUFFER: usize = 256;

pub type EventSender = mpsc::Sender<GameEvent>;
pub type EventReceiver = mpsc::Receiver<GameEvent>;

/// Live subscription to one page session. Dropping it unsubscribes.
pub struct EventSubscription {
    bus: EventBus,
    session_id: SessionId,
    subscriber_id: usize,
    pub receiver: EventReceiver,
}

impl EventSubscription {
    pub fn receiver(&mut self) -> &mut EventReceiver {
        &mut self.receiver
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(&self.session_id, self.subscriber_id);
    }
}

type SubscriberMap = HashMap<SessionId, Vec<(usize, EventSender)>>;

#[derive(Debug, Clone, Default)]
pub struct EventBus {
    inner: Arc<EventBusInner>,
}

#[derive(Debug, Default)]
struct EventBusInner {
    subscribers: RwLock<SubscriberMap>,
    next_id: AtomicUsize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, session_id: SessionId) -> EventSubscription {
        let (subscriber_id, receiver) = self.subscribe_raw(session_id.clone());
        EventSubscription {
            bus: self.clone(),
            session_id,
            subscriber_id,
            receiver,
        }
    }

    fn subscribe_raw(&self, session_id: SessionId) -> (usize, EventReceiver) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_BUFFER);
        let id = self.inner.next_id.fetch_add(1, Ordering::AcqRel);
        self.write()
            .entry(session_id.clone())
            .or_default()
            .push((id, tx));

        tracing::info!(
            session_id = %session_id,
            subscriber_id = id,
            "client subscribed to game events"
        );

        (id, rx)
    }

    pub fn broadcast(&self, session_id: &SessionId, event: GameEvent) {
        tracing::debug!(
            session_id = %session_id,
            event_type = event.kind(),
            "broadcasting game event"
        );

        let subscribers = self.read().get(session_id).cloned();
        let Some(list) = subscribers else {
            return;
        };

        let mut failed = Vec::new();
        for (id, sender) in list {
            if let Err(e) = sender.try_send(event.clone()) {
                tracing::warn!(
                    session_id = %session_id,
                    subscriber_id = id,
                    error = %e,
                    "dropping subscriber"
                );
                failed.push(id);
            }
        }
        if !failed.is_empty() {
            self.remove_subscribers(session_id, &failed);
        }
    }

    pub fn broadcast_all(&self, session_id: &SessionId, events: &[GameEvent]) {
        for event in events {
            self.broadcast(session_id, event.clone());
        }
    }

    pub fn unsubscribe(&self, session_id: &SessionId, subscriber_id: usize) {
        self.remove_subscribers(session_id, &[subscriber_id]);
    }

    pub fn drop_session(&self, session_id: &SessionId) {
        self.write().remove(session_id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.read().values().map(|list| list.len()).sum()
    }

    fn remove_subscribers(&self, session_id: &SessionId, ids: &[usize]) {
        let mut guard = self.write();
        if let Some(list) = guard.get_mut(session_id) {
            list.retain(|(id, _)| !ids.contains(id));
            if list.is_empty() {
                guard.remove(session_id);
            }
        }
    }

    // The map only holds senders, so a panic mid-update cannot leave it torn.
    fn read(&self) -> RwLockReadGuard<'_, SubscriberMap> {
        self.inner
            .subscribers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SubscriberMap> {
        self.inner
            .subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Player as shown to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: usize,
    pub name: String,
    pub initials: String,
    pub color: String,
    pub score: u32,
}

impl PlayerInfo {
    pub fn from_player(id: usize, player: &Player) -> Self {
        Self {
            id,
            name: player.name.clone(),
            initials: player.initials(),
            color: player.color.clone(),
            score: player.score,
        }
    }

    pub fn list(players: &[Player]) -> Vec<Self> {
        players
            .iter()
            .enumerate()
            .map(|(id, p)| Self::from_player(id, p))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    NamesRequired {
        session_id: SessionId,
        count: usize,
    },
    NamesRejected {
        session_id: SessionId,
        names: Vec<String>,
        message: String,
    },
    RoundStarted {
        session_id: SessionId,
        generation: u64,
        difficulty: Difficulty,
        columns: usize,
        rows: usize,
        card_count: usize,
        players: Vec<PlayerInfo>,
    },
    CardFlipped {
        session_id: SessionId,
        position: usize,
        symbol: String,
    },
    ScoreChanged {
        session_id: SessionId,
        player: usize,
        score: u32,
    },
    CardsMatched {
        session_id: SessionId,
        positions: [usize; 2],
    },
    CardsVacated {
        session_id: SessionId,
        positions: [usize; 2],
    },
    CardsHidden {
        session_id: SessionId,
        positions: [usize; 2],
    },
    TurnChanged {
        session_id: SessionId,
        player: usize,
    },
    TurnAnnounced {
        session_id: SessionId,
        player: usize,
        name: String,
        initials: String,
        color: String,
        text: String,
    },
    RoundComplete {
        session_id: SessionId,
        headline: String,
        details: Vec<String>,
        outcome: Outcome,
    },
    BoardCleared {
        session_id: SessionId,
    },
    SessionEnded {
        session_id: SessionId,
        reason: String,
    },
    Error {
        session_id: SessionId,
        message: String,
    },
}

impl GameEvent {
    /// Translates one engine effect. Scheduling requests are not events and
    /// yield `None`, as does a turn announcement with no round to name.
    pub fn from_effect(
        session_id: &SessionId,
        effect: &Effect,
        session: Option<&Session>,
    ) -> Option<Self> {
        let session_id = session_id.clone();
        let event = match effect {
            Effect::NamesRequired { count } => GameEvent::NamesRequired {
                session_id,
                count: *count,
            },
            Effect::NamesRejected { names, message } => GameEvent::NamesRejected {
                session_id,
                names: names.clone(),
                message: message.clone(),
            },
            Effect::RoundStarted {
                generation,
                difficulty,
                card_count,
                players,
            } => {
                let (columns, rows) = difficulty.grid();
                GameEvent::RoundStarted {
                    session_id,
                    generation: *generation,
                    difficulty: *difficulty,
                    columns,
                    rows,
                    card_count: *card_count,
                    players: PlayerInfo::list(players),
                }
            }
            Effect::CardFlipped { position, value } => GameEvent::CardFlipped {
                session_id,
                position: *position,
                symbol: value.glyph().to_string(),
            },
            Effect::ScoreChanged { player, score } => GameEvent::ScoreChanged {
                session_id,
                player: *player,
                score: *score,
            },
            Effect::CardsMatched { first, second } => GameEvent::CardsMatched {
                session_id,
                positions: [*first, *second],
            },
            Effect::CardsVacated { first, second } => GameEvent::CardsVacated {
                session_id,
                positions: [*first, *second],
            },
            Effect::CardsHidden { first, second } => GameEvent::CardsHidden {
                session_id,
                positions: [*first, *second],
            },
            Effect::TurnChanged { player } => GameEvent::TurnChanged {
                session_id,
                player: *player,
            },
            Effect::TurnAnnounced { player } => {
                let announcement = TurnAnnouncement::for_player(session?, *player)?;
                GameEvent::TurnAnnounced {
                    session_id,
                    player: *player,
                    text: announcement.text(),
                    name: announcement.name,
                    initials: announcement.initials,
                    color: announcement.color,
                }
            }
            Effect::RoundComplete { outcome } => GameEvent::RoundComplete {
                session_id,
                headline: outcome.headline(),
                details: outcome.details(),
                outcome: outcome.clone(),
            },
            Effect::BoardCleared => GameEvent::BoardCleared { session_id },
            Effect::Schedule { .. } => return None,
        };
        Some(event)
    }

    /// The serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            GameEvent::NamesRequired { .. } => "names_required",
            GameEvent::NamesRejected { .. } => "names_rejected",
            GameEvent::RoundStarted { .. } => "round_started",
            GameEvent::CardFlipped { .. } => "card_flipped",
            GameEvent::ScoreChanged { .. } => "score_changed",
            GameEvent::CardsMatched { .. } => "cards_matched",
            GameEvent::CardsVacated { .. } => "cards_vacated",
            GameEvent::CardsHidden { .. } => "cards_hidden",
            GameEvent::TurnChanged { .. } => "turn_changed",
            GameEvent::TurnAnnounced { .. } => "turn_announced",
            GameEvent::RoundComplete { .. } => "round_complete",
            GameEvent::BoardCleared { .. } => "board_cleared",
            GameEvent::SessionEnded { .. } => "session_ended",
            GameEvent::Error { .. } => "error",
        }
    }
}
