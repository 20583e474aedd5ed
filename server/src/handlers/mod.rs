pub mod health;
pub mod routes;
pub mod sse;
pub mod utils;

pub use routes::{Router, build_router};
