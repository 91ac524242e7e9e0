//! The value-transformation pipeline between logical values and stored strings.
//!
//! Every function here is pure or touches only the store it is handed. Failures
//! are returned, never swallowed; the facade in [`crate::sdk`] decides how to
//! surface them.

pub mod defaults;
pub mod envelope;
pub mod migrate;
pub mod path;

pub use envelope::{decode, encode, Decoded};
