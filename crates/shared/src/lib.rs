//! Types shared between the scheduler client, the reference event service and its storage.

pub mod domain;
pub mod error;
pub mod protocol;
pub mod validation;
