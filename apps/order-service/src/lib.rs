//! Delivery-order service library.
//!
//! Clients place orders (the travel distance between two coordinates is
//! resolved through an external distance API), list them, and claim
//! ("take") unassigned ones. The claim path is the core: a non-blocking
//! exclusive row lock in PostgreSQL guarantees that among any number of
//! concurrent claim attempts on one order, exactly one succeeds. The rest
//! observe either a terminal-state conflict or immediate contention, never
//! a queue.
//!
//! Layering: HTTP handlers ([`server`]) → [`workflows`] → ports
//! ([`repository`], [`distance`]) → PostgreSQL / Distance Matrix API. All
//! cross-request coordination happens in the store; the process keeps no
//! shared mutable state of its own.

pub mod config;
pub mod distance;
pub mod error;
pub mod models;
pub mod repository;
pub mod server;
pub mod workflows;
