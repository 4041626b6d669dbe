//! Wicker
//!
//! Wicker is the in-memory order-basket aggregate of an e-commerce checkout service: an item tree with merge and cascade semantics, deterministic content fingerprinting, a multi-phase refresh reconciliation and a build-to-order configuration assembler.

pub mod actualizer;
pub mod basket;
pub mod catalog;
pub mod configuration;
pub mod factory;
pub mod finder;
pub mod items;
pub mod refresher;
pub mod users;
