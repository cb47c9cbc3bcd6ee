pub mod client;
pub mod handlers;
pub mod picker;
pub mod types;

pub use client::{MovieCatalog, TmdbClient, TmdbError, TmdbResult};
pub use handlers::*;
pub use picker::*;
pub use types::*;
