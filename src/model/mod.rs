pub mod common;
pub mod configuration;
pub mod endpoint;
pub mod error;
pub mod item;
pub mod schema;
pub mod user_context;

pub use common::*;
pub use configuration::*;
pub use endpoint::*;
pub use error::*;
pub use item::*;
pub use schema::*;
pub use user_context::*;
