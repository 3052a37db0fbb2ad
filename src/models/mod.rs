//! Data models for the NKO directory.
//!
//! Request bodies use snake_case field names, matching the frontend contract.

mod city;
mod logo;
mod news;
mod nko;
mod user;

pub use city::*;
pub use logo::*;
pub use news::*;
pub use nko::*;
pub use user::*;
