//! Command-line front end of certrefresh
//!
//! The `certrefresh` binary parses flags, loads configuration and hands an
//! [`context::AppContext`] to one of the [`commands`].

pub mod certfile;
pub mod commands;
pub mod context;
pub mod output;
