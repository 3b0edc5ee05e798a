//! Process-wide request budget for the exam endpoints.
//!
//! Every call to a generation, grading or commentary route spends LLM quota,
//! so the budget is shared by all clients rather than kept per address. The
//! budget refills at the start of each one-second window; a rejected request
//! is told how long until the next refill.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderValue, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

const WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct Window {
    opened_at: Instant,
    spent: u32,
}

#[derive(Clone, Debug)]
pub struct RequestBudget {
    per_window: u32,
    window: Arc<Mutex<Window>>,
}

impl RequestBudget {
    /// A budget of `per_second` requests; zero is raised to one.
    pub fn new(per_second: u32) -> Self {
        Self {
            per_window: per_second.max(1),
            window: Arc::new(Mutex::new(Window {
                opened_at: Instant::now(),
                spent: 0,
            })),
        }
    }

    pub fn try_acquire(&self) -> Result<(), Duration> {
        self.try_acquire_at(Instant::now())
    }

    /// Spends one request from the window containing `now`, or returns the
    /// time left until that window closes.
    fn try_acquire_at(&self, now: Instant) -> Result<(), Duration> {
        let mut window = self
            .window
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let elapsed = now.saturating_duration_since(window.opened_at);
        if elapsed >= WINDOW {
            window.opened_at = now;
            window.spent = 0;
        }

        if window.spent < self.per_window {
            window.spent += 1;
            Ok(())
        } else {
            Err(WINDOW.saturating_sub(elapsed))
        }
    }
}

/// Whole seconds a client should wait, never less than one.
fn retry_after_secs(wait: Duration) -> u64 {
    let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    secs.max(1)
}

fn too_many_requests(wait: Duration) -> Response {
    let secs = retry_after_secs(wait);
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({ "error": "Too many requests", "retryAfter": secs })),
    )
        .into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(secs));
    response
}

pub async fn request_budget_middleware(
    State(budget): State<RequestBudget>,
    req: Request<Body>,
    next: Next,
) -> Response {
    match budget.try_acquire() {
        Ok(()) => next.run(req).await,
        Err(wait) => {
            tracing::warn!(path = %req.uri().path(), ?wait, "Request budget exhausted");
            too_many_requests(wait)
        }
    }
}
