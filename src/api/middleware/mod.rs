//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Role gate: bearer token validation for the route group's role
//! 2. Audit logger: records the caller after auth has identified them

pub mod audit;
pub mod auth;
