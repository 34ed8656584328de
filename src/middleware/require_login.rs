use axum::{extract::Request, middleware::Next, response::Response};

use super::session::Session;
use crate::views::redirect;

/// Auth gate for page routes: anonymous visitors are sent to `/login`
/// before the handler body runs.
pub async fn require_login(request: Request, next: Next) -> Response {
    let logged_in = request
        .extensions()
        .get::<Session>()
        .map(|session| session.current_user().is_some())
        .unwrap_or(false);

    if !logged_in {
        tracing::debug!("Blocked anonymous request to {}", request.uri().path());
        return redirect("/login");
    }

    next.run(request).await
}
