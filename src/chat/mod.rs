pub mod controller;
pub mod models;
pub mod stream;
pub mod view;
pub use controller::*;
pub use models::*;
