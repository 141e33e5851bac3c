//! Web middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Session loader: resolves cookies into `SessionContext`
//! 2. Access log: sees the resolved user and every final status
//! 3. Login guard: protected routes only, injects `SessionUser`

pub mod audit;
pub mod session;
