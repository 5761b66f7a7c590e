//! Biblioteca application library
//!
//! Service modules live here; the binary in `main.rs` wires them to the
//! settings, the connection pool and the HTTP server.

pub mod modules;
