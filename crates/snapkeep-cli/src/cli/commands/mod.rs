//! CLI command handlers. Each command is in its own file.

mod console;
mod fetch;
mod list;
mod log_view;
mod prune;
mod run;

pub use console::run_console;
pub use fetch::run_fetch;
pub use list::run_list;
pub use prune::run_prune;
pub use run::run_job;
