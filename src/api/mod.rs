mod client;
pub mod public;
pub use client::ApiClient;
