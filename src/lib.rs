//! Reports over Harvest time entries. Every (client, project, task) triple gets a short code
//! that stays the same between runs, which keeps the half-hour schedule grid compact enough
//! to read in a terminal.
//!

pub mod cli;
pub mod entities;
pub mod harvest;
pub mod shortcode;
pub mod utils;
