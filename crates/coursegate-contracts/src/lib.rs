//! # coursegate-contracts
//!
//! Shared types, configuration, and errors for the coursegate access layer.
//!
//! All crates in the workspace import from here. No decision logic lives in
//! this crate, only data definitions and the small helpers they carry.

pub mod access;
pub mod audit;
pub mod config;
pub mod error;
pub mod role;
pub mod session;
