//! Lexer (tokenizer) for B source code
//!
//! Converts a raw byte stream into [`Token`]s, one per call.  The input is
//! read through a bounded double buffer, so
//! arbitrarily large files are scanned in constant memory.  Identifiers are
//! resolved through an interned word table pre-seeded with the keywords, so a
//! keyword spelling always yields its keyword token and a repeated name always
//! yields the same canonical token.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use rustc_hash::FxHashMap;

use crate::buffer::DoubleBuffer;

/// All token variants produced by the lexer.
///
/// The four lexeme-bearing classes (`Name`, `NumericConstant`, `CharConstant`,
/// `StringLiteral`) own their text; keywords and operators are identified by
/// variant alone.  B spells compound assignment with the `=` first (`=+`,
/// `=<<`, ...), hence the `Eq`-prefixed operator names.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Lexeme-bearing classes
    Name(String),
    NumericConstant(String),
    CharConstant(String),
    StringLiteral(String),

    // Keywords
    Auto,
    Extrn,
    If,
    Else,
    Goto,
    Switch,
    Case,
    While,
    Return,

    // Punctuation
    LBracket,  // [
    RBracket,  // ]
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    Question,  // ?
    Colon,     // :
    Semicolon, // ;
    Comma,     // ,

    // Operators
    Amp,    // &
    AndAnd, // &&
    Star,   // *
    Plus,   // +
    PlusPlus,
    Minus, // -
    MinusMinus,
    Tilde,   // ~
    Bang,    // !
    NotEq,   // !=
    Slash,   // /
    Percent, // %
    Lt,      // <
    LtLt,    // <<
    Le,      // <=
    Gt,      // >
    GtGt,    // >>
    Ge,      // >=
    Caret,   // ^
    Pipe,    // |
    OrOr,    // ||
    Eq,      // =
    EqEq,    // ==

    // Compound assignment (B order: '=' first)
    EqAmp,     // =&
    EqStar,    // =*
    EqPlus,    // =+
    EqMinus,   // =-
    EqSlash,   // =/
    EqPercent, // =%
    EqLtLt,    // =<<
    EqGtGt,    // =>>
    EqCaret,   // =^
    EqPipe,    // =|

    /// End of input; returned forever once the source is exhausted.
    Eof,
    /// A byte no rule recognized, carrying its code.
    Unknown(u8),
}

impl Token {
    /// Returns the text payload for the lexeme-bearing classes.
    pub fn lexeme(&self) -> Option<&str> {
        match self {
            Token::Name(s)
            | Token::NumericConstant(s)
            | Token::CharConstant(s)
            | Token::StringLiteral(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Name(s) => write!(f, "name '{}'", s),
            Token::NumericConstant(s) => write!(f, "numeric constant {}", s),
            Token::CharConstant(s) => write!(f, "char constant '{}'", s),
            Token::StringLiteral(s) => write!(f, "string literal \"{}\"", s),
            Token::Auto => write!(f, "'auto'"),
            Token::Extrn => write!(f, "'extrn'"),
            Token::If => write!(f, "'if'"),
            Token::Else => write!(f, "'else'"),
            Token::Goto => write!(f, "'goto'"),
            Token::Switch => write!(f, "'switch'"),
            Token::Case => write!(f, "'case'"),
            Token::While => write!(f, "'while'"),
            Token::Return => write!(f, "'return'"),
            Token::LBracket => write!(f, "'['"),
            Token::RBracket => write!(f, "']'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::LBrace => write!(f, "'{{'"),
            Token::RBrace => write!(f, "'}}'"),
            Token::Question => write!(f, "'?'"),
            Token::Colon => write!(f, "':'"),
            Token::Semicolon => write!(f, "';'"),
            Token::Comma => write!(f, "','"),
            Token::Amp => write!(f, "'&'"),
            Token::AndAnd => write!(f, "'&&'"),
            Token::Star => write!(f, "'*'"),
            Token::Plus => write!(f, "'+'"),
            Token::PlusPlus => write!(f, "'++'"),
            Token::Minus => write!(f, "'-'"),
            Token::MinusMinus => write!(f, "'--'"),
            Token::Tilde => write!(f, "'~'"),
            Token::Bang => write!(f, "'!'"),
            Token::NotEq => write!(f, "'!='"),
            Token::Slash => write!(f, "'/'"),
            Token::Percent => write!(f, "'%'"),
            Token::Lt => write!(f, "'<'"),
            Token::LtLt => write!(f, "'<<'"),
            Token::Le => write!(f, "'<='"),
            Token::Gt => write!(f, "'>'"),
            Token::GtGt => write!(f, "'>>'"),
            Token::Ge => write!(f, "'>='"),
            Token::Caret => write!(f, "'^'"),
            Token::Pipe => write!(f, "'|'"),
            Token::OrOr => write!(f, "'||'"),
            Token::Eq => write!(f, "'='"),
            Token::EqEq => write!(f, "'=='"),
            Token::EqAmp => write!(f, "'=&'"),
            Token::EqStar => write!(f, "'=*'"),
            Token::EqPlus => write!(f, "'=+'"),
            Token::EqMinus => write!(f, "'=-'"),
            Token::EqSlash => write!(f, "'=/'"),
            Token::EqPercent => write!(f, "'=%'"),
            Token::EqLtLt => write!(f, "'=<<'"),
            Token::EqGtGt => write!(f, "'=>>'"),
            Token::EqCaret => write!(f, "'=^'"),
            Token::EqPipe => write!(f, "'=|'"),
            Token::Eof => write!(f, "end of input"),
            Token::Unknown(b) => write!(f, "unknown byte {:#04x}", b),
        }
    }
}

/// Lexer error type.
///
/// Covers the two fatal conditions: a read failure from the underlying source
/// and a character constant running past its maximum raw length without a
/// closing quote.  Grammar problems are never lexer errors.
#[derive(Debug)]
pub struct LexError {
    pub message: String,
    pub line: usize,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lexer error at line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for LexError {}

/// Significant length of an identifier; longer runs are consumed in full but
/// only the first eight bytes are kept as the lexeme.
const MAX_NAME_LENGTH: usize = 8;

/// Maximum raw bytes inside a character constant.
const MAX_CHAR_LENGTH: usize = 4;

/// Streaming lexer for B source code.
pub struct Lexer<R: Read> {
    source: DoubleBuffer<R>,
    words: FxHashMap<String, Token>,
    line: usize,
}

impl Lexer<File> {
    /// Lexer over a file on disk.  Failing to open the file is fatal to the
    /// run; there is no recovery policy for source I/O.
    pub fn from_path<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

impl<R: Read> Lexer<R> {
    pub fn new(reader: R) -> Self {
        Self::over(DoubleBuffer::new(reader))
    }

    /// Lexer with a custom buffer-region capacity.  Token output must be
    /// identical for every capacity; tests rely on this to prove region
    /// switches are unobservable.
    pub fn with_buffer_capacity(reader: R, capacity: usize) -> Self {
        Self::over(DoubleBuffer::with_capacity(reader, capacity))
    }

    fn over(source: DoubleBuffer<R>) -> Self {
        let mut words = FxHashMap::default();
        for (spelling, token) in [
            ("auto", Token::Auto),
            ("extrn", Token::Extrn),
            ("if", Token::If),
            ("else", Token::Else),
            ("goto", Token::Goto),
            ("switch", Token::Switch),
            ("case", Token::Case),
            ("while", Token::While),
            ("return", Token::Return),
        ] {
            words.insert(spelling.to_string(), token);
        }
        Self {
            source,
            words,
            line: 1,
        }
    }

    /// Number of newlines consumed so far, plus one.  Kept for diagnostics;
    /// the recognizer works on token indices and never consults it.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Drain the stream into a materialized sequence ending in exactly one
    /// [`Token::Eof`].
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Produce the next token.  Returns [`Token::Eof`] once the input is
    /// exhausted and keeps returning it on further calls.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        while let Some(byte) = self.peek_byte()? {
            if !byte.is_ascii_whitespace() {
                break;
            }
            if byte == b'\n' {
                self.line += 1;
            }
            self.bump()?;
        }

        let byte = match self.bump()? {
            Some(byte) => byte,
            None => return Ok(Token::Eof),
        };

        match byte {
            b'[' => Ok(Token::LBracket),
            b']' => Ok(Token::RBracket),
            b'(' => Ok(Token::LParen),
            b')' => Ok(Token::RParen),
            b'{' => Ok(Token::LBrace),
            b'}' => Ok(Token::RBrace),
            b'?' => Ok(Token::Question),
            b':' => Ok(Token::Colon),
            b';' => Ok(Token::Semicolon),
            b',' => Ok(Token::Comma),
            b'~' => Ok(Token::Tilde),
            b'^' => Ok(Token::Caret),
            b'%' => Ok(Token::Percent),
            b'*' => Ok(Token::Star),
            b'&' => self.one_or_two(b'&', Token::AndAnd, Token::Amp),
            b'+' => self.one_or_two(b'+', Token::PlusPlus, Token::Plus),
            b'-' => self.one_or_two(b'-', Token::MinusMinus, Token::Minus),
            b'!' => self.one_or_two(b'=', Token::NotEq, Token::Bang),
            b'|' => self.one_or_two(b'|', Token::OrOr, Token::Pipe),
            b'=' => self.equal_operator(),
            b'<' => match self.peek_byte()? {
                Some(b'<') => {
                    self.bump()?;
                    Ok(Token::LtLt)
                }
                Some(b'=') => {
                    self.bump()?;
                    Ok(Token::Le)
                }
                _ => Ok(Token::Lt),
            },
            b'>' => match self.peek_byte()? {
                Some(b'>') => {
                    self.bump()?;
                    Ok(Token::GtGt)
                }
                Some(b'=') => {
                    self.bump()?;
                    Ok(Token::Ge)
                }
                _ => Ok(Token::Gt),
            },
            b'/' => {
                if self.peek_byte()? == Some(b'*') {
                    self.skip_comment()?;
                    self.next_token()
                } else {
                    Ok(Token::Slash)
                }
            }
            b'\'' => self.char_constant(),
            b'"' => self.string_literal(),
            b'A'..=b'Z' | b'a'..=b'z' | b'_' | b'.' => self.name(byte),
            b'0'..=b'9' => self.numeric_constant(byte),
            _ => Ok(Token::Unknown(byte)),
        }
    }

    /// Greedy two-byte operator: `second` completes the long form, anything
    /// else degrades to the short one.
    fn one_or_two(&mut self, second: u8, long: Token, short: Token) -> Result<Token, LexError> {
        if self.peek_byte()? == Some(second) {
            self.bump()?;
            Ok(long)
        } else {
            Ok(short)
        }
    }

    /// Everything starting with `=`: `==`, the `=op` compound assignments,
    /// and plain `=`.  The three-byte forms `=<<` and `=>>` need a second
    /// lookahead; when it fails the consumed `<`/`>` is pushed back so it is
    /// rescanned as its own token.
    fn equal_operator(&mut self) -> Result<Token, LexError> {
        let token = match self.peek_byte()? {
            Some(b'&') => Token::EqAmp,
            Some(b'*') => Token::EqStar,
            Some(b'+') => Token::EqPlus,
            Some(b'-') => Token::EqMinus,
            Some(b'/') => Token::EqSlash,
            Some(b'%') => Token::EqPercent,
            Some(b'^') => Token::EqCaret,
            Some(b'|') => Token::EqPipe,
            Some(b'=') => Token::EqEq,
            Some(sign @ (b'<' | b'>')) => {
                self.bump()?;
                if self.peek_byte()? == Some(sign) {
                    self.bump()?;
                    return Ok(if sign == b'<' {
                        Token::EqLtLt
                    } else {
                        Token::EqGtGt
                    });
                }
                self.source.unread(sign);
                return Ok(Token::Eq);
            }
            _ => return Ok(Token::Eq),
        };
        self.bump()?;
        Ok(token)
    }

    /// Skip a `/* ... */` comment.  Newlines inside still advance the line
    /// counter; an unterminated comment simply runs to end of input.
    fn skip_comment(&mut self) -> Result<(), LexError> {
        self.bump()?; // the '*' that opened the comment
        loop {
            match self.bump()? {
                None => return Ok(()),
                Some(b'\n') => self.line += 1,
                Some(b'*') => {
                    if self.peek_byte()? == Some(b'/') {
                        self.bump()?;
                        return Ok(());
                    }
                }
                Some(_) => {}
            }
        }
    }

    /// Character constant: raw bytes up to the closing quote, which is
    /// consumed but excluded.  More than `MAX_CHAR_LENGTH` raw bytes without
    /// a closing quote is fatal; the grammar has no way to express such a
    /// constant, so the whole run aborts.
    fn char_constant(&mut self) -> Result<Token, LexError> {
        let mut lexeme = String::new();
        loop {
            match self.peek_byte()? {
                Some(b'\'') => {
                    self.bump()?;
                    break;
                }
                Some(byte) => {
                    if lexeme.len() == MAX_CHAR_LENGTH {
                        return Err(LexError {
                            message: "character constant not terminated with single quote"
                                .to_string(),
                            line: self.line,
                        });
                    }
                    lexeme.push(byte as char);
                    self.bump()?;
                }
                None => break,
            }
        }
        Ok(Token::CharConstant(lexeme))
    }

    /// String literal: raw bytes up to the closing quote (consumed,
    /// excluded), no length cap.  End of input closes the literal.
    fn string_literal(&mut self) -> Result<Token, LexError> {
        let mut lexeme = String::new();
        loop {
            match self.peek_byte()? {
                Some(b'"') => {
                    self.bump()?;
                    break;
                }
                Some(byte) => {
                    lexeme.push(byte as char);
                    self.bump()?;
                }
                None => break,
            }
        }
        Ok(Token::StringLiteral(lexeme))
    }

    /// Identifier: letters, digits, `_` and `.`.  The full run is consumed,
    /// but only the first `MAX_NAME_LENGTH` bytes are significant and kept as
    /// the lexeme.  The completed text resolves through the word table so a
    /// keyword spelling yields its keyword token and a repeated name yields
    /// the canonical interned token.
    fn name(&mut self, first: u8) -> Result<Token, LexError> {
        let mut lexeme = String::new();
        lexeme.push(first as char);
        while let Some(byte) = self.peek_byte()? {
            if !(byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'.') {
                break;
            }
            if lexeme.len() < MAX_NAME_LENGTH {
                lexeme.push(byte as char);
            }
            self.bump()?;
        }
        Ok(self
            .words
            .entry(lexeme)
            .or_insert_with_key(|spelling| Token::Name(spelling.clone()))
            .clone())
    }

    /// Numeric constant: decimal digits only, no length bound.
    fn numeric_constant(&mut self, first: u8) -> Result<Token, LexError> {
        let mut digits = String::new();
        digits.push(first as char);
        while let Some(byte) = self.peek_byte()? {
            if !byte.is_ascii_digit() {
                break;
            }
            digits.push(byte as char);
            self.bump()?;
        }
        Ok(Token::NumericConstant(digits))
    }

    fn peek_byte(&mut self) -> Result<Option<u8>, LexError> {
        let line = self.line;
        self.source.peek().map_err(|e| read_error(e, line))
    }

    fn bump(&mut self) -> Result<Option<u8>, LexError> {
        let line = self.line;
        self.source.advance().map_err(|e| read_error(e, line))
    }
}

fn read_error(error: io::Error, line: usize) -> LexError {
    LexError {
        message: format!("read from source failed: {}", error),
        line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Lexer::new(source.as_bytes()).tokenize().unwrap()
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = lex("main() { return(0); }");
        assert_eq!(
            tokens,
            vec![
                Token::Name("main".to_string()),
                Token::LParen,
                Token::RParen,
                Token::LBrace,
                Token::Return,
                Token::LParen,
                Token::NumericConstant("0".to_string()),
                Token::RParen,
                Token::Semicolon,
                Token::RBrace,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_never_lex_as_names() {
        // Repeated sightings must keep yielding the keyword token.
        let tokens = lex("auto auto extrn while");
        assert_eq!(
            tokens,
            vec![
                Token::Auto,
                Token::Auto,
                Token::Extrn,
                Token::While,
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_operators_maximal_munch() {
        let tokens = lex("++ -- == != <= >= << >> && ||");
        assert_eq!(
            tokens,
            vec![
                Token::PlusPlus,
                Token::MinusMinus,
                Token::EqEq,
                Token::NotEq,
                Token::Le,
                Token::Ge,
                Token::LtLt,
                Token::GtGt,
                Token::AndAnd,
                Token::OrOr,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_compound_assignment_operators() {
        let tokens = lex("=& =* =+ =- =/ =% =^ =| =<< =>>");
        assert_eq!(
            tokens,
            vec![
                Token::EqAmp,
                Token::EqStar,
                Token::EqPlus,
                Token::EqMinus,
                Token::EqSlash,
                Token::EqPercent,
                Token::EqCaret,
                Token::EqPipe,
                Token::EqLtLt,
                Token::EqGtGt,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_shift_assign_is_one_token() {
        assert_eq!(lex("=<<"), vec![Token::EqLtLt, Token::Eof]);
    }

    #[test]
    fn test_incomplete_shift_assign_degrades() {
        // '=<' not followed by '<': the '<' is pushed back and rescanned.
        assert_eq!(lex("=<x"), vec![
            Token::Eq,
            Token::Lt,
            Token::Name("x".to_string()),
            Token::Eof
        ]);
        assert_eq!(lex("=>1"), vec![
            Token::Eq,
            Token::Gt,
            Token::NumericConstant("1".to_string()),
            Token::Eof
        ]);
    }

    #[test]
    fn test_comment_is_transparent() {
        assert_eq!(lex("a/* x\ny */b"), lex("a b"));
    }

    #[test]
    fn test_comment_newlines_count() {
        let mut lexer = Lexer::new("a/* x\ny */b\n".as_bytes());
        lexer.tokenize().unwrap();
        assert_eq!(lexer.line(), 3);
    }

    #[test]
    fn test_slash_alone_is_divide() {
        assert_eq!(lex("a/b"), vec![
            Token::Name("a".to_string()),
            Token::Slash,
            Token::Name("b".to_string()),
            Token::Eof
        ]);
    }

    #[test]
    fn test_char_constant() {
        assert_eq!(lex("'ab'"), vec![
            Token::CharConstant("ab".to_string()),
            Token::Eof
        ]);
    }

    #[test]
    fn test_char_constant_max_length() {
        assert_eq!(lex("'abcd'"), vec![
            Token::CharConstant("abcd".to_string()),
            Token::Eof
        ]);
    }

    #[test]
    fn test_overlong_char_constant_is_fatal() {
        let result = Lexer::new("'abcde'".as_bytes()).tokenize();
        assert!(result.is_err());
    }

    #[test]
    fn test_string_literal_unbounded() {
        let tokens = lex("\"hello, world\"");
        assert_eq!(tokens, vec![
            Token::StringLiteral("hello, world".to_string()),
            Token::Eof
        ]);
    }

    #[test]
    fn test_name_run_consumed_lexeme_truncated() {
        // The whole identifier is consumed; only eight bytes stay significant.
        let tokens = lex("abcdefghijkl next");
        assert_eq!(tokens, vec![
            Token::Name("abcdefgh".to_string()),
            Token::Name("next".to_string()),
            Token::Eof
        ]);
    }

    #[test]
    fn test_name_may_contain_dot_and_underscore() {
        assert_eq!(lex(".a_1"), vec![
            Token::Name(".a_1".to_string()),
            Token::Eof
        ]);
    }

    #[test]
    fn test_unknown_byte_degrades() {
        assert_eq!(lex("@"), vec![Token::Unknown(b'@'), Token::Eof]);
    }

    #[test]
    fn test_eof_is_idempotent() {
        let mut lexer = Lexer::new("x".as_bytes());
        assert_eq!(lexer.next_token().unwrap(), Token::Name("x".to_string()));
        assert_eq!(lexer.next_token().unwrap(), Token::Eof);
        assert_eq!(lexer.next_token().unwrap(), Token::Eof);
    }

    #[test]
    fn test_line_counter() {
        let mut lexer = Lexer::new("a\nb\n\nc".as_bytes());
        lexer.tokenize().unwrap();
        assert_eq!(lexer.line(), 4);
    }

    #[test]
    fn test_tokens_straddle_buffer_boundary() {
        // With a tiny region capacity every token straddles a switch; the
        // output must be identical to the single-region scan.
        let source = "frobnicator() { extrn putchar; putchar('hi!\n'); \"a longer string\"; }";
        let reference = lex(source);
        for capacity in 1..16 {
            let tokens = Lexer::with_buffer_capacity(source.as_bytes(), capacity)
                .tokenize()
                .unwrap();
            assert_eq!(tokens, reference, "capacity {}", capacity);
        }
    }
}
