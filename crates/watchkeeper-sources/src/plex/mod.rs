pub mod api;
pub mod auth;
pub mod client;

pub use auth::verify_token;
pub use client::PlexGateway;
