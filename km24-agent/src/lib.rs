//! km24-agent library interface
//!
//! Turns slug-keyed monitoring filters into KM24 step parts and checks them
//! against live platform data.

pub mod error;
pub mod filters;
pub mod health;
pub mod platform;
pub mod validation;

pub use crate::error::{Error, Result};
pub use crate::filters::{translate, FilterSpec, FilterValue};
pub use crate::platform::{Km24Client, ModuleCache, PlatformGateway};
pub use crate::validation::{Hit, ValidationVerdict, Validator};
