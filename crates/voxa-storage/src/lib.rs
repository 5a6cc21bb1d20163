//! Voxa Storage Library
//!
//! This crate provides the storage abstraction used by the ingestion pipeline:
//! the `Storage` trait, its S3 and local filesystem implementations, and the
//! `MediaUploader` that pushes converted artifacts and measures the upload.
//!
//! # Storage key format
//!
//! Uploaded artifacts land under `input/{timestamp}-{suffix}_{filename}` where
//! the timestamp is a UTC `YYYYMMDDTHHMMSS.ffffffZ` value and the suffix is
//! random, so keys sort by upload time and never collide. Keys must not
//! contain `..` or a leading `/`. Key generation lives in the `keys` module so
//! all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;
pub mod uploader;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
pub use uploader::{MediaUploader, StorageLocation};
pub use voxa_core::StorageBackend;
