//! SQLite storage implementation for Questboard.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `questboard-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for quests, profiles and badges
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel dependencies exist.
//! Reads go through the r2d2 pool; every write is funnelled through the
//! single writer actor, which is what gives the array and counter helpers
//! their per-document atomicity.
//!
//! ```text
//!   core (domain)        server (HTTP)
//!         │                    │
//!         └─────────┬──────────┘
//!                   │
//!                   ▼
//!         storage-sqlite (this crate)
//!                   │
//!                   ▼
//!               SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod badges;
pub mod profiles;
pub mod quests;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, get_db_path, init, run_migrations, spawn_writer, DbConnection,
    DbPool, WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use badges::BadgeRepository;
pub use profiles::ProfileRepository;
pub use quests::QuestRepository;

// Re-export from questboard-core for convenience
pub use questboard_core::errors::{DatabaseError, Error, Result};
