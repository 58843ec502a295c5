pub mod client;

pub use client::TmdbRatings;
