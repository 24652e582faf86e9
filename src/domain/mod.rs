//! Domain types for tapi.
//!
//! This module contains the todo entity and the value objects used to
//! create, update and query it.

mod todo;

pub use todo::*;
