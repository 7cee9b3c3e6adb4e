pub mod game;
pub mod health;
pub mod sse;

pub use game::{
    click_card, create_session, delete_session, get_session, get_session_state, reset_round,
    start_round, submit_names, ActionResponse, CreateSessionRequest, FormValue, NamesRequest,
    SessionResponse, StartRequest,
};
pub use health::health;
pub use sse::stream_events;
