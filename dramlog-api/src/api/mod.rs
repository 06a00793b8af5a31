//! HTTP API handlers for dramlog-api

pub mod auth;
pub mod badges;
pub mod bottles;
pub mod entities;
pub mod health;
pub mod sse;
pub mod stores;
pub mod tastings;
pub mod users;

pub use auth::{require_auth, CurrentUser};
pub use badges::{create_badge, get_badge, list_badges, list_user_awards};
pub use bottles::{
    create_bottle, get_bottle, get_bottle_prices, get_bottle_tags, list_bottle_tastings,
};
pub use entities::{create_entity, get_entity};
pub use health::health_routes;
pub use sse::event_stream;
pub use stores::{create_store, ingest_prices};
pub use tastings::{create_tasting, get_tasting};
pub use users::list_user_tags;
