//! SQLx-based repositories

pub mod key_record_repository;

pub use key_record_repository::SqlxKeyRecordRepository;
