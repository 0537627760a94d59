//! SQLite storage implementation for quests.

mod model;
mod repository;

pub use model::QuestDB;
pub use repository::{QuestRepository, ORGANIZER_INDEX};
