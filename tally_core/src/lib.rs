#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

pub const TALLY_CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

// Core modules
pub mod aspect;
pub mod command;
pub mod metadata;
pub mod parser;
pub mod registry;
pub mod response;

// Re-exports for convenience
pub use aspect::{Aspect, ValueKind};
pub use command::{Action, ArgShape, Command};
pub use metadata::QueryMetadata;
pub use parser::{ParseError, ParseResult, PatternError, QueryEvaluator, Token, TokenKind};
pub use registry::{AspectRegistry, CommandRegistry, RegistryError};
pub use response::{Response, ResponseType};
