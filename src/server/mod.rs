pub mod router;

pub use router::{AppState, sync_router};
