//! # Introduction
//!
//! blang is a syntax checker for the B programming language: it reads a B
//! source file, tokenizes it, and reports whether the token stream conforms
//! to the grammar, together with the furthest token index recognition
//! reached, the only error-localization hint.  It builds no AST and performs
//! no semantic analysis.
//!
//! ## Checking pipeline
//!
//! ```text
//! Source bytes → Lexer → Vec<Token> → Recognizer → (accepted, furthest)
//! ```
//!
//! 1. `buffer` — double-buffered byte source; bounded memory regardless of
//!    file size.
//! 2. [`lexer`] — streaming tokenizer with an interned word table (keywords
//!    pre-seeded) and greedy maximal-munch operator scanning.
//! 3. [`recognizer`] — backtracking recursive descent over the materialized
//!    token sequence, tracking the deepest cursor position any attempted
//!    parse path reached.

mod buffer;
pub mod lexer;
pub mod recognizer;
