//! Lightgate kernel: a login page gated by a serial status light.
//!
//! `serial` finds and opens the board, `monitor` turns its GREEN / RED lines
//! into the shared `Readiness` flag, and `http` exposes that flag plus the
//! login action.

pub mod bootstrap;
pub mod config;
pub mod discovery;
pub mod error;
pub mod http;
pub mod monitor;
pub mod serial;
pub mod state;

pub use error::GateError;
pub use state::Readiness;
