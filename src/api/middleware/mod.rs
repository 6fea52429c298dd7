//! API middleware stack.
//!
//! 1. Access logger — one structured line per request

pub mod audit;
