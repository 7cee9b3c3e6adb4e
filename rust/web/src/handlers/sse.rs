use crate::errors::IntoErrorResponse;
use crate::events::{EventBus, EventSubscription, GameEvent};
use crate::session::{SessionId, SessionManager};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use warp::http;
use warp::reply::{self, Response};
use warp::sse;
use warp::Reply;

/// `GET /api/sessions/{id}/events`
///
/// Server-sent stream of [`GameEvent`] JSON, one `game_event` per engine
/// effect, including the delayed flip-backs and removals driven by timers.
pub async fn stream_events(
    session_id: SessionId,
    sessions: Arc<SessionManager>,
    event_bus: Arc<EventBus>,
) -> Response {
    if let Err(err) = sessions.state(&session_id) {
        return err.into_http_response();
    }

    let subscription = event_bus.subscribe(session_id);
    let keep_alive = sse::keep_alive()
        .interval(Duration::from_secs(15))
        .text(":keep-alive\n");

    let reply = sse::reply(keep_alive.stream(subscription_stream(subscription)));
    reply::with_header(reply, http::header::CACHE_CONTROL, "no-cache").into_response()
}

// The stream owns the subscription so the client is unsubscribed when the
// connection drops.
fn subscription_stream(
    mut subscription: EventSubscription,
) -> impl tokio_stream::Stream<Item = Result<sse::Event, Infallible>> {
    let (_, placeholder_rx) = mpsc::channel(1);
    let receiver = std::mem::replace(subscription.receiver(), placeholder_rx);
    let subscription = Arc::new(subscription);

    ReceiverStream::new(receiver).map(move |event| {
        let _held = Arc::clone(&subscription);
        Ok(render_event(&event))
    })
}

fn render_event(event: &GameEvent) -> sse::Event {
    let data = serde_json::to_string(event).unwrap_or_else(|err| {
        serde_json::json!({
            "type": "error",
            "message": format!("failed to serialize game event: {err}")
        })
        .to_string()
    });
    sse::Event::default().event("game_event").data(data)
}
