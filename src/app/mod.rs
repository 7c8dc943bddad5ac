// HTTP surface: shared state, route handlers and the server loop.

pub mod handlers;
pub mod server;
pub mod state;

pub use server::{build_router, serve};
pub use state::{AppState, DataContext};
