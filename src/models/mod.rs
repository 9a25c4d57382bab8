//! Wire models for the ShikshaVani backend, split by domain.
//!
//! Every type here is fetched from the backend; the client never persists
//! anything except the session identity.

pub mod class;
pub mod feedback;
pub mod summary;
pub mod user;

pub use class::*;
pub use feedback::*;
pub use summary::*;
pub use user::*;
