use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

pub mod auth;
pub mod entries;

/// `302 Found` to `location`.
pub fn redirect(location: &'static str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}
