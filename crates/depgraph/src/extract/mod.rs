//! Per-file symbol extraction.
//!
//! Extraction is lexical: a tokenizer feeds a brace-tracking scan that
//! recognizes declarations by keyword and treats other identifiers as
//! references. No type checking or cross-file resolution happens here; the
//! [`Index`](crate::index::Index) joins per-file results by name.
//!
//! Every function in this module is pure and safe to call from many threads
//! at once.

mod conformance;
mod keywords;
mod lexer;
mod symbols;

pub use conformance::resolve_conformances;
pub use lexer::{tokenize, LexProblem, Lexed, Token, TokenKind};
pub use symbols::{extract, FileExtraction};
