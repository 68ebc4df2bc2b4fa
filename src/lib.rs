//! Dialogue Policy - Transaction-dialogue state engine
//!
//! This crate implements the state-manipulation core of a transaction
//! dialogue policy: an append-only exchange history, single-pass context
//! extraction, result classification, pure transition operations, and the
//! context tagging consumed by an external template layer.

pub mod dialogue;
pub mod foundation;
pub mod statement;
