pub mod app;
pub mod error;
pub mod geometry;
pub mod model;
pub mod server;
pub mod store;
pub mod sync;
pub mod util;
