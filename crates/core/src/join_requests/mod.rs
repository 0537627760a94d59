//! Join-request workflow - per (quest, requester) state machine.

mod join_requests_model;
mod join_requests_service;
mod join_requests_traits;


pub use join_requests_model::{JoinRequestState, JoinTransition, NewJoinRequest};
pub use join_requests_service::JoinRequestService;
pub use join_requests_traits::JoinRequestServiceTrait;
