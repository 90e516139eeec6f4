pub mod handlers;
pub mod routes;
pub mod user_extractor;
pub mod view_handlers;

pub use handlers::*;
pub use routes::*;
pub use view_handlers::*;
