//! Database models split into domain-specific modules.

pub mod item;
pub mod missing_report;
pub mod order;
pub mod user;

pub use item::*;
pub use missing_report::*;
pub use order::*;
pub use user::*;
