//! Background Tasks Module
//!
//! Contains the background task that actively expires cache entries.
//!
//! # Tasks
//! - Sweeper: runs the configured expiration strategy every sweep interval

mod sweeper;

pub(crate) use sweeper::{spawn_sweeper, Sweeper};
