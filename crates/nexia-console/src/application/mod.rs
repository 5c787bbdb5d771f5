//! Application layer orchestrating the terminal interface.
//!
//! This module handles command-line parsing and the interactive UI loop. It
//! coordinates between the console state machine and the terminal.

pub mod cli;
pub mod ui;
