//! `x-request-id` handling
//!
//! Every request leaves with an id: the caller's own when the widget or a
//! proxy sent one, a fresh UUID otherwise. The same id is forwarded to Gemini
//! so a chat reply can be traced end to end.

use axum::http::{HeaderMap, HeaderName};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Layer pair for the app router: assign on the way in, copy onto the response.
pub fn request_id_layer() -> (SetRequestIdLayer<MakeRequestUuid>, PropagateRequestIdLayer) {
    let name = HeaderName::from_static(X_REQUEST_ID);
    (
        SetRequestIdLayer::new(name.clone(), MakeRequestUuid),
        PropagateRequestIdLayer::new(name),
    )
}

pub trait RequestIdExt {
    /// The id assigned by [`request_id_layer`], if it is valid UTF-8
    fn request_id(&self) -> Option<&str>;
}

impl RequestIdExt for HeaderMap {
    fn request_id(&self) -> Option<&str> {
        self.get(X_REQUEST_ID)?.to_str().ok()
    }
}
