mod console;
pub mod events;

pub use console::*;
