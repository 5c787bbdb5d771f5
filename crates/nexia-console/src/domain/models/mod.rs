mod event;
mod input;
mod outcome;
mod output;
mod run;
mod runtime;

pub use event::*;
pub use input::*;
pub use outcome::*;
pub use output::*;
pub use run::*;
pub use runtime::*;
