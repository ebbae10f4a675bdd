//! Per-request access log for the session routes.
//!
//! The `SessionID` header is a bearer credential, so only whether one was
//! sent is recorded, never its value. A 401 is the normal answer to a
//! missing or expired session and is logged at info, not warn.

use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{Level, event};

use crate::routes::SESSION_ID_HEADER;
use crate::state::AppState;

/// What is kept from a request until its response is ready.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RequestSummary {
    method: Method,
    route: String,
    session_present: bool,
}

impl RequestSummary {
    fn of(request: &Request<Body>) -> Self {
        Self {
            method: request.method().clone(),
            route: request.uri().path().to_string(),
            session_present: request
                .headers()
                .get(SESSION_ID_HEADER)
                .is_some_and(|v| !v.is_empty()),
        }
    }

    fn record(&self, status: StatusCode, elapsed: Duration) {
        let (method, route, status_code, elapsed_ms) = (
            self.method.as_str(),
            self.route.as_str(),
            status.as_u16(),
            elapsed.as_millis() as u64,
        );
        macro_rules! emit {
            ($level:expr, $msg:literal) => {
                event!(
                    $level,
                    method,
                    route,
                    session_present = self.session_present,
                    status = status_code,
                    elapsed_ms,
                    $msg
                )
            };
        }

        let level = level_for(status);
        if level == Level::ERROR {
            emit!(Level::ERROR, "session request failed");
        } else if level == Level::WARN {
            emit!(Level::WARN, "session request rejected");
        } else {
            emit!(Level::INFO, "session request handled");
        }
    }
}

fn level_for(status: StatusCode) -> Level {
    if status.is_server_error() {
        Level::ERROR
    } else if status.is_client_error() && status != StatusCode::UNAUTHORIZED {
        Level::WARN
    } else {
        Level::INFO
    }
}

/// Logs one line per request when `request_logging` is enabled.
pub async fn request_logging_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.request_logging {
        return next.run(request).await;
    }

    let summary = RequestSummary::of(&request);
    let started = Instant::now();
    let response = next.run(request).await;
    summary.record(response.status(), started.elapsed());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use axum::{Router, middleware, routing::get};
    use tessera_session::{MemoryStore, SessionManager, SessionPolicy, StaticVerifier};
    use tower::ServiceExt;

    fn create_test_state(request_logging: bool) -> AppState {
        let sessions = SessionManager::new(
            StaticVerifier::demo(),
            MemoryStore::new(),
            SessionPolicy::default(),
        );
        AppState::new(
            sessions,
            ServerConfig::new().with_request_logging(request_logging),
        )
    }

    fn create_test_router(state: AppState) -> Router {
        Router::new()
            .route("/profile", get(|| async { StatusCode::UNAUTHORIZED }))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                request_logging_middleware,
            ))
            .with_state(state)
    }

    #[tokio::test]
    async fn test_logging_passes_response_through() {
        for enabled in [true, false] {
            let app = create_test_router(create_test_state(enabled));
            let response = app
                .oneshot(
                    Request::builder()
                        .uri("/profile")
                        .header(SESSION_ID_HEADER, "abc")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_summary_records_presence_not_value() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/refresh?x=1")
            .header(SESSION_ID_HEADER, "secret-session-id")
            .body(Body::empty())
            .unwrap();
        let summary = RequestSummary::of(&request);

        assert_eq!(summary.method, Method::POST);
        assert_eq!(summary.route, "/refresh");
        assert!(summary.session_present);
        assert!(!format!("{:?}", summary).contains("secret-session-id"));

        let bare = Request::builder()
            .uri("/profile")
            .header(SESSION_ID_HEADER, "")
            .body(Body::empty())
            .unwrap();
        assert!(!RequestSummary::of(&bare).session_present);
    }

    #[test]
    fn test_unauthorized_is_not_a_warning() {
        assert_eq!(level_for(StatusCode::CREATED), Level::INFO);
        assert_eq!(level_for(StatusCode::UNAUTHORIZED), Level::INFO);
        assert_eq!(level_for(StatusCode::BAD_REQUEST), Level::WARN);
        assert_eq!(level_for(StatusCode::SERVICE_UNAVAILABLE), Level::ERROR);
    }
}
