pub mod field_types;
pub mod label;
pub mod merge;
pub mod template;
pub mod upsert;
pub mod views;

pub use field_types::*;
pub use label::*;
pub use merge::*;
pub use template::*;
pub use upsert::*;
pub use views::*;
