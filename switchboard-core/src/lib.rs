//! Wire model shared by the relay and its clients.

pub mod model;

pub use model::*;
