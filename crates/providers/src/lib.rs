//! LLM Provider implementations for hassist.
//!
//! All providers implement the `hassist_core::Provider` trait.
//! The router builds the configured provider and its request defaults.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{ModelBinding, build_from_config};
