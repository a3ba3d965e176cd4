//! API handlers module

pub mod batches;
pub mod catalog;
pub mod drugs;
pub mod health;
pub mod registrations;
