//! Terminal front end for the binary

mod command;
mod console;

pub use command::{plot_request, Command};
pub use console::Console;
