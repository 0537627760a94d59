//! Completion module - derives a quest's completed status from badge activity.

mod completion_model;
mod completion_service;
mod completion_traits;

#[cfg(test)]
mod completion_service_tests;

pub use completion_model::{count_distinct_givers, threshold_met, CompletionStatus};
pub use completion_service::CompletionService;
pub use completion_traits::CompletionServiceTrait;
