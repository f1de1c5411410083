// Database module for transcriptd
// Provides SQLite persistence for jobs, recordings, segments, and speakers

pub mod manager;
pub mod migrations;
pub mod models;
pub mod jobs_repo;
pub mod recordings_repo;
pub mod segments_repo;
pub mod speakers_repo;

pub use manager::DatabaseManager;
pub use models::*;
