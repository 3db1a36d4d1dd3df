//! EventLens server library: shared state, event registry and HTTP routes.

pub mod registry;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
