pub mod config;
pub mod templates;
pub use config::AppConfig;

/// Where a controller wants the user to go next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// The chat page
    Root,
    /// The sign in / sign up page
    Auth,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Root => "/",
            Route::Auth => "/auth",
        }
    }
}
