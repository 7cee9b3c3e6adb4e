use std::time::Instant;
use warp::http::{Method, StatusCode};
use warp::path::FullPath;
use warp::reject::Rejection;
use warp::reply::{Reply, Response};
use warp::Filter;

#[derive(Debug, Clone)]
struct RequestInfo {
    path: String,
    method: Method,
    start: Instant,
}

/// Wraps `filter` so every matched request is logged on arrival and again
/// with its status and duration once the reply is built.
pub fn with_request_logging<F, T>(
    filter: F,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone
where
    F: Filter<Extract = (T,), Error = Rejection> + Clone + Send + Sync + 'static,
    T: Reply,
{
    warp::any()
        .and(warp::path::full())
        .and(warp::method())
        .map(|path: FullPath, method: Method| {
            tracing::debug!(path = %path.as_str(), method = %method, "incoming request");
            RequestInfo {
                path: path.as_str().to_string(),
                method,
                start: Instant::now(),
            }
        })
        .and(filter)
        .map(|info: RequestInfo, reply: T| {
            let response = reply.into_response();
            log_response(
                response.status(),
                &info.path,
                info.method.as_str(),
                info.start.elapsed().as_millis(),
            );
            response
        })
}

/// Logs a finished request at a level matching its status class.
pub fn log_response(status: StatusCode, path: &str, method: &str, duration_ms: u128) {
    let code = status.as_u16();
    if status.is_server_error() {
        tracing::error!(status = code, path, method, duration_ms, "server error");
    } else if status.is_client_error() {
        tracing::warn!(status = code, path, method, duration_ms, "client error");
    } else {
        tracing::info!(status = code, path, method, duration_ms, "response sent");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::TestLogSubscriber;
    use tracing::Level;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    fn capture(f: impl FnOnce()) -> Vec<crate::logging::LogEntry> {
        let subscriber = TestLogSubscriber::new();
        let registry = Registry::default().with(subscriber.clone().into_layer::<Registry>());
        tracing::subscriber::with_default(registry, f);
        subscriber.entries()
    }

    #[tokio::test]
    async fn wrapped_route_logs_request_and_status() {
        let subscriber = TestLogSubscriber::new();
        let registry = Registry::default().with(subscriber.clone().into_layer::<Registry>());
        let _guard = tracing::subscriber::set_default(registry);

        let route = warp::path!("ping")
            .and(warp::get())
            .map(|| warp::reply::json(&"pong"));

        let response = warp::test::request()
            .method("GET")
            .path("/ping")
            .reply(&with_request_logging(route))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let entries = subscriber.entries();
        assert!(entries
            .iter()
            .any(|e| e.level == Level::DEBUG && e.message.contains("incoming request")));
        let sent = entries
            .iter()
            .find(|e| e.message.contains("response sent"))
            .expect("completion logged");
        assert_eq!(sent.field("status"), Some("200"));
        assert_eq!(sent.field("path"), Some("/ping"));
    }

    #[test]
    fn client_errors_log_as_warnings() {
        let entries = capture(|| log_response(StatusCode::GONE, "/api/sessions/x", "GET", 3));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, Level::WARN);
        assert_eq!(entries[0].field("status"), Some("410"));
    }

    #[test]
    fn server_errors_log_as_errors() {
        let entries = capture(|| {
            log_response(StatusCode::INTERNAL_SERVER_ERROR, "/api/sessions", "POST", 9)
        });
        assert_eq!(entries[0].level, Level::ERROR);
        assert!(entries[0].message.contains("server error"));
    }
}
