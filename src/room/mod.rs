pub mod handlers;
pub mod service;
pub mod types;

pub use handlers::*;
pub use service::RoomService;
pub use types::*;
