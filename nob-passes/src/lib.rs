//! Semantic passes that run between parsing and code generation.

pub mod functions;
