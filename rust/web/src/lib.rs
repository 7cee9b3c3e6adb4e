//! HTTP frontend for the memora engine.
//!
//! Each browser page owns a [`PageSession`] holding one engine controller
//! across rounds. Clicks and form submissions arrive as JSON requests, engine
//! effects go out as [`GameEvent`]s over server-sent events, and the delayed
//! flip-backs and removals run as tokio timers that re-enter the session.

pub mod errors;
pub mod events;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod server;
pub mod session;
pub mod static_handler;

pub use errors::{ErrorResponse, ErrorSeverity, IntoErrorResponse};
pub use events::{EventBus, EventSubscription, GameEvent, PlayerInfo};
pub use logging::{init_logging, LogEntry, LogFormat, TestLogSubscriber};
pub use middleware::{log_response, with_request_logging};
pub use server::{AppContext, ServerConfig, ServerError, ServerHandle, WebServer};
pub use session::{
    CardView, Dispatch, GameConfig, GameStateResponse, PageSession, SessionError, SessionId,
    SessionManager, StatePhase,
};
pub use static_handler::{StaticError, StaticHandler};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_provides_shared_components() {
        let ctx = AppContext::new_for_tests();

        assert_eq!(ctx.event_bus().subscriber_count(), 0);
        assert!(ctx.sessions().active_sessions().is_empty());
        assert!(ctx.static_handler().root().is_none());
    }
}
