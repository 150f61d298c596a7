//! Terminal front-end

pub mod console;
pub mod renderer;

pub use console::Console;
pub use renderer::{Command, ConsoleRenderer};
