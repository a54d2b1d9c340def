#![doc = include_str!("../README.md")]

mod error;
mod limit;

mod lexer;
mod parser;
pub mod tables;

pub use crate::error::{DiagnosticData, Error, Severity};
pub use crate::lexer::{Lexer, Token, TokenKind};
pub use crate::limit::LimitTracker;
pub use crate::parser::{Parser, SyntaxTree};
