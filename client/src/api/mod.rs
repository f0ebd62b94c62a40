//! HTTP surface of the marketplace API.

pub mod client;

pub use client::ApiClient;
