//! HTTP gateway for the photo booth: the voice-reply NDJSON endpoint, the
//! background-removal and stylize endpoints, and a liveness route.

mod routes;
mod server;
mod state;

pub use routes::build_router;
pub use server::run_server;
pub use state::AppState;
