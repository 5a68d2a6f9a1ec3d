//! Runtime for driving chat sessions
//!
//! A session runs one exchange at a time; the caller decides when to send and
//! when to cancel.

mod executor;


pub use executor::ChatRuntime;
