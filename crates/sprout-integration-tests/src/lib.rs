//! Integration test crate for the sprout engine.
//!
//! This crate has no library code — it only contains integration tests
//! that exercise end-to-end mission and progression flows across the
//! workspace crates.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p sprout-integration-tests
//! ```
