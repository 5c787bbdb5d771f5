//! Core domain logic for the console.
//!
//! This module contains the run state machine and the data models it works on,
//! independent of which interpreter executes the code or how the console is drawn.

pub mod models;
pub mod services;
