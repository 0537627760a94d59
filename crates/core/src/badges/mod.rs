//! Badges module - append-only badge ledger.

mod badges_model;
mod badges_service;
mod badges_traits;


pub use badges_model::{Badge, BadgeStats, BadgeType, NewBadge};
pub use badges_service::BadgeService;
pub use badges_traits::{BadgeRepositoryTrait, BadgeServiceTrait};
