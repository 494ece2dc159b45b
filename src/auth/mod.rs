pub mod cache;
pub mod controller;
pub mod view;
pub use cache::{CachedUser, UserCache};
pub use controller::*;
