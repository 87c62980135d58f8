//! Concrete LLM provider implementations.

pub mod dummy;
pub mod openai_compatible;
