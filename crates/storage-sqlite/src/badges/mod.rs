//! SQLite storage implementation for the badge ledger.

mod model;
mod repository;

pub use model::BadgeDB;
pub use repository::BadgeRepository;
