//! Test Helper Utilities
//!
//! Shared utilities for testing km24-agent

#![allow(dead_code, unused_imports)]

pub mod fake_gateway;
pub mod fake_platform;

// Re-export commonly used items
pub use fake_gateway::{arbejdstilsyn, raw_hits, Call, FakeGateway};
pub use fake_platform::{FakePlatform, TEST_API_KEY};
