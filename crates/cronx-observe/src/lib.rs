//! Logging bootstrap shared by the cronx binaries and test harnesses.
mod logger;
pub use logger::*;
