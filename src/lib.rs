//! Keeps a workstation from appearing idle by issuing a small, reversible
//! mouse nudge, but only after double-checking that the user has genuinely
//! stepped away. Runs in a terminal until interrupted, no daemon and no
//! state on disk.

pub mod cli;
pub mod input_api;
pub mod mover;
pub mod utils;
