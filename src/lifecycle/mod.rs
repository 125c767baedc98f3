//! Process lifecycle management.
//!
//! Startup order is: settings, logging, config registration, then the
//! listener — so by the time the socket accepts its first connection the
//! registry is complete and immutable. Shutdown stops the accept loop and
//! drains in-flight dispatches before the process exits.

pub mod shutdown;

pub use shutdown::Shutdown;
