pub mod configuration_store;
pub mod invalidation;
pub mod memory;
pub mod postgres;
pub mod schema;
pub mod traits;

pub use configuration_store::*;
pub use invalidation::*;
pub use memory::*;
pub use postgres::*;
pub use schema::*;
pub use traits::*;
