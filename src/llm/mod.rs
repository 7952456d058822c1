#[cfg(feature = "together")]
pub mod client;
pub mod prompts;
pub mod resolver;
pub mod types;
pub mod verifier;

#[cfg(feature = "together")]
pub use client::*;
pub use resolver::*;
pub use types::*;
pub use verifier::*;
