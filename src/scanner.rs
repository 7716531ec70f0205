//! Lexer for Lox source text.
//!
//! [`Scanner`] walks the input once, byte by byte, and yields
//! `Result<Token, LoxError>` items.  A bad character or an unterminated string
//! comes out as an `Err` item and scanning carries on after it, so one pass
//! reports every lexical error in the file.  The last item is always a single
//! `EOF` token; after that the iterator is fused.
//!
//! Recognised input:
//!
//! - punctuation `( ) { } , . - + ; * /` and the operators `! != = == < <= > >=`
//!   (the two-byte form wins when it matches)
//! - `//` line comments, skipped with `memchr`
//! - string literals in double quotes, possibly spanning lines, no escapes
//! - numbers: digits with an optional `.digits` fraction
//! - identifiers, with keywords looked up in a compile-time `phf` map
//!
//! ```rust
//! use rox::scanner::Scanner;
//!
//! let (tokens, errors) = Scanner::new("print 123; // example").scan_tokens();
//! assert_eq!(tokens.len(), 4);
//! assert!(errors.is_empty());
//! ```

use std::iter::FusedIterator;

use log::{debug, info};
use memchr::memchr;
use phf::phf_map;

use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};

static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "and"    => TokenType::AND,
    "class"  => TokenType::CLASS,
    "else"   => TokenType::ELSE,
    "false"  => TokenType::FALSE,
    "fun"    => TokenType::FUN,
    "for"    => TokenType::FOR,
    "if"     => TokenType::IF,
    "nil"    => TokenType::NIL,
    "or"     => TokenType::OR,
    "print"  => TokenType::PRINT,
    "return" => TokenType::RETURN,
    "super"  => TokenType::SUPER,
    "this"   => TokenType::THIS,
    "true"   => TokenType::TRUE,
    "var"    => TokenType::VAR,
    "while"  => TokenType::WHILE,
};

pub struct Scanner<'a> {
    source: &'a str,
    bytes: &'a [u8],

    /// First byte of the lexeme being scanned.
    start: usize,

    /// Next byte to look at.
    pos: usize,

    line: usize,
    done: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        info!("Scanner created over {} bytes", source.len());

        Self {
            source,
            bytes: source.as_bytes(),
            start: 0,
            pos: 0,
            line: 1,
            done: false,
        }
    }

    /// Run the scanner to completion.  The token vector always ends with `EOF`.
    pub fn scan_tokens(self) -> (Vec<Token>, Vec<LoxError>) {
        let mut tokens: Vec<Token> = Vec::new();
        let mut errors: Vec<LoxError> = Vec::new();

        for item in self {
            match item {
                Ok(token) => tokens.push(token),
                Err(e) => errors.push(e),
            }
        }

        info!(
            "Scanning finished: {} token(s), {} error(s)",
            tokens.len(),
            errors.len()
        );

        (tokens, errors)
    }

    #[inline(always)]
    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Current byte, or `0` past the end.
    #[inline(always)]
    fn current(&self) -> u8 {
        self.bytes.get(self.pos).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn lookahead(&self) -> u8 {
        self.bytes.get(self.pos + 1).copied().unwrap_or(0)
    }

    /// Callers check [`at_end`](Self::at_end) first.
    #[inline(always)]
    fn bump(&mut self) -> u8 {
        let byte: u8 = self.bytes[self.pos];
        self.pos += 1;
        byte
    }

    #[inline(always)]
    fn eat(&mut self, expected: u8) -> bool {
        let hit: bool = !self.at_end() && self.current() == expected;
        if hit {
            self.pos += 1;
        }
        hit
    }

    #[inline(always)]
    fn either(&mut self, with_equal: TokenType, alone: TokenType) -> TokenType {
        if self.eat(b'=') {
            with_equal
        } else {
            alone
        }
    }

    /// Lexeme boundaries always fall on ASCII bytes, so slicing is safe.
    #[inline(always)]
    fn lexeme(&self) -> &'a str {
        &self.source[self.start..self.pos]
    }

    /// Consume one lexeme.  `Ok(None)` means it was whitespace or a comment.
    fn scan_token(&mut self) -> Result<Option<TokenType>> {
        let kind: TokenType = match self.bump() {
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b'-' => TokenType::MINUS,
            b'+' => TokenType::PLUS,
            b';' => TokenType::SEMICOLON,
            b'*' => TokenType::STAR,

            b'!' => self.either(TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.either(TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.either(TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.either(TokenType::GREATER_EQUAL, TokenType::GREATER),

            b'/' if self.eat(b'/') => {
                // Stop on the newline so the line counter still sees it.
                self.pos = match memchr(b'\n', &self.bytes[self.pos..]) {
                    Some(offset) => self.pos + offset,
                    None => self.bytes.len(),
                };
                return Ok(None);
            }
            b'/' => TokenType::SLASH,

            b' ' | b'\r' | b'\t' => return Ok(None),

            b'\n' => {
                self.line += 1;
                return Ok(None);
            }

            b'"' => self.string()?,

            b'0'..=b'9' => self.number(),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            _ => {
                // Skip the whole code point, not just its first byte.
                let ch: char = self.source[self.start..]
                    .chars()
                    .next()
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                self.pos = self.start + ch.len_utf8();

                return Err(LoxError::lex(
                    self.line,
                    format!("Unexpected character: {}", ch),
                ));
            }
        };

        Ok(Some(kind))
    }

    fn string(&mut self) -> Result<TokenType> {
        while !self.at_end() && self.current() != b'"' {
            if self.bump() == b'\n' {
                self.line += 1;
            }
        }

        if self.at_end() {
            return Err(LoxError::lex(self.line, "Unterminated string."));
        }

        self.pos += 1;

        let contents: &str = &self.source[self.start + 1..self.pos - 1];
        Ok(TokenType::STRING(contents.to_owned()))
    }

    fn number(&mut self) -> TokenType {
        self.skip_digits();

        // `1.` is a number followed by a DOT.
        if self.current() == b'.' && self.lookahead().is_ascii_digit() {
            self.pos += 1;
            self.skip_digits();
        }

        // Only ASCII digits and at most one '.' reach here.
        let value: f64 = self.lexeme().parse::<f64>().unwrap_or(0.0);
        TokenType::NUMBER(value)
    }

    fn skip_digits(&mut self) {
        while self.current().is_ascii_digit() {
            self.pos += 1;
        }
    }

    fn identifier(&mut self) -> TokenType {
        while matches!(self.current(), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            self.pos += 1;
        }

        KEYWORDS
            .get(self.lexeme())
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        while !self.at_end() {
            self.start = self.pos;

            match self.scan_token() {
                Ok(Some(kind)) => {
                    debug!("Scanned {:?} on line {}", kind, self.line);
                    return Some(Ok(Token::new(kind, self.lexeme(), self.line)));
                }
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }

        self.done = true;
        Some(Ok(Token::new(TokenType::EOF, "", self.line)))
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
