//! Discord adapter: serenity gateway events in, serenity HTTP calls out.

pub mod handler;
pub mod platform;

use std::sync::Arc;

use serenity::{Client, http::Http};

use relay_core::Relay;

pub use {handler::RelayHandler, platform::SerenityPlatform};

/// A `ChatPlatform` backed by a fresh serenity HTTP client for `token`.
pub fn platform_for_token(token: &str) -> (Arc<Http>, SerenityPlatform) {
    let http = Arc::new(Http::new(token));
    let platform = SerenityPlatform::new(Arc::clone(&http));
    (http, platform)
}

/// Build the gateway client for `relay`. The returned client's `start`
/// drives the event loop until shutdown.
pub async fn client(token: &str, relay: Arc<Relay>) -> serenity::Result<Client> {
    Client::builder(token, RelayHandler::intents())
        .event_handler(RelayHandler::new(relay))
        .await
}
