//! Application Layer
//!
//! The application layer orchestrates domain logic through use cases.
//! It defines:
//!
//! - **Ports**: Interfaces for the trade source, trade store and throttle
//! - **Services**: Port decorators shared by the use cases
//! - **Use Cases**: Gap sync and range backfill

pub mod ports;
pub mod services;
pub mod use_cases;

pub use ports::*;
pub use services::*;
pub use use_cases::*;
