//! Inbound adapters that translate user input into screen actions while
//! keeping terminal details at the edge.

pub mod cli;
