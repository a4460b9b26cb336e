//! Parse and execute logic for each command family.
//!
//! Every module exposes its script keywords as constants, `parse_*`
//! functions registered in [`crate::parser`], and the functions
//! [`Command::execute`](crate::Command::execute) dispatches to.

pub mod comment;
pub mod delay;
pub mod key_combo;
pub mod text;
