//! # logflume-queue
//!
//! Redis list transport for the logflume pipeline. Producers push serialized
//! envelopes onto a single named list; the worker pops them with a blocking
//! timeout. This crate owns the connection handling and the list commands,
//! nothing else; routing and persistence live downstream.

pub mod client;

pub use client::{QueueConfig, RedisLogQueue};
