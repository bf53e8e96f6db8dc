//! API handlers module

pub mod analysis;
pub mod documents;
pub mod health;
