//! Quests module - domain models, services, and traits.

mod quests_model;
mod quests_service;
mod quests_traits;


pub use quests_model::{
    quest_dedupe_key, JoinRequest, NewQuest, Quest, QuestOrder, QuestStatus, QuestUpdate,
    StatusChange,
};
pub use quests_service::QuestService;
pub use quests_traits::{QuestRepositoryTrait, QuestServiceTrait};
