//! Core types for dynakv: the key/value driver contract, the item key scheme,
//! the binary codec and key pattern parsing.
//!
//! Nothing in this crate talks to a store.

pub mod kv;
