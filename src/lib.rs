//! Session core for an image-archive viewer: merges images from multiple
//! compressed archives into one ordered collection, drives loads against a
//! size-bounded local library, and navigates adjacent archives along the
//! persisted history order.

pub mod app;
pub mod domain;
pub mod infra;
