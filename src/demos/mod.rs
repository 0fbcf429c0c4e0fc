//! Demo runners used by the command line front end.

pub mod newspaper;
pub mod run_all;
pub mod toc;

pub use newspaper::run as run_newspaper;
pub use run_all::run as run_all_demos;
pub use toc::{run as run_toc, run_sample};
