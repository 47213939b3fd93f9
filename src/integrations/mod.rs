//! Remote Haaflah API.

pub mod api;
pub mod auth;
pub mod events;
pub mod participants;

pub use api::ApiClient;
