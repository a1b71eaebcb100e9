//! Lexer over PGN game text.
//!
//! Ported from `PgnDatabase.cpp`'s flex-generated scanner: the token
//! classes recognized there (`IS_PGN_HEADER`, `IS_PGN_MOVENUM`,
//! `IS_PGN_MOVE`, `IS_PGN_RESULT`, `IS_PGN_EVAL`) reappear here as the
//! variants of [`Token`]. Operates over any [`BufRead`] one byte at a
//! time, tracking the current line number so callers can report useful
//! error positions and so random access can reseed the counter after a
//! seek (see [`Tokenizer::set_line_number`]).

use std::io::{self, BufRead};

use chess_core::Color;

/// A recognized tag-pair header name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderName {
    Event,
    Site,
    Date,
    Round,
    White,
    Black,
    Result,
    Annotator,
    Eco,
    WhiteElo,
    BlackElo,
    Opening,
    Variation,
    TimeControl,
    SetUp,
    Fen,
    /// Any tag this reader has no specific handling for. Carries the raw
    /// tag name so callers can still see it if they care to.
    Unknown(String),
}

impl HeaderName {
    fn parse(name: &str) -> HeaderName {
        match name {
            "Event" => HeaderName::Event,
            "Site" => HeaderName::Site,
            "Date" => HeaderName::Date,
            "Round" => HeaderName::Round,
            "White" => HeaderName::White,
            "Black" => HeaderName::Black,
            "Result" => HeaderName::Result,
            "Annotator" => HeaderName::Annotator,
            "ECO" => HeaderName::Eco,
            "WhiteElo" => HeaderName::WhiteElo,
            "BlackElo" => HeaderName::BlackElo,
            "Opening" => HeaderName::Opening,
            "Variation" => HeaderName::Variation,
            "TimeControl" => HeaderName::TimeControl,
            "SetUp" => HeaderName::SetUp,
            "FEN" => HeaderName::Fen,
            other => HeaderName::Unknown(other.to_string()),
        }
    }
}

/// A single lexical token of PGN game text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Header(HeaderName, String),
    MoveNumber(u32, Color),
    Move(String),
    Nag(u8),
    /// `!`, `?`, `!!`, `??`, `!?`, `?!`, or the novelty marker `N`.
    SymbolicEval(String),
    Comment(String),
    RestOfLineComment(String),
    VarStart,
    VarEnd,
    Result(String),
}

/// Errors raised while lexing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenizerError {
    #[error("line {0}: unmatched quotes in header")]
    UnmatchedQuotes(u32),
    #[error("line {0}: unterminated comment")]
    UnterminatedComment(u32),
    #[error("line {0}: invalid NAG value '{1}'")]
    InvalidNag(u32, String),
    #[error("line {0}: spurious character '{1}'")]
    SpuriousChar(u32, char),
    #[error("line {0}: malformed header")]
    MalformedHeader(u32),
    #[error("I/O error reading PGN text: {0}")]
    Io(String),
}

impl From<io::Error> for TokenizerError {
    fn from(e: io::Error) -> Self {
        TokenizerError::Io(e.to_string())
    }
}

const MOVE_CHARS: &str = "=+#-";

fn is_move_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || MOVE_CHARS.contains(c)
}

/// Byte-at-a-time lexer over a [`BufRead`] source.
pub struct Tokenizer<R> {
    reader: R,
    peeked: Option<u8>,
    line: u32,
}

impl<R: BufRead> Tokenizer<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, peeked: None, line: 1 }
    }

    /// The 1-based line the next token starts on (or just finished on).
    pub fn line_number(&self) -> u32 {
        self.line
    }

    /// Reseeds the line counter after the caller has seeked the
    /// underlying reader to a known offset/line (random access).
    pub fn set_line_number(&mut self, line: u32) {
        self.line = line;
    }

    fn peek_byte(&mut self) -> io::Result<Option<u8>> {
        if self.peeked.is_none() {
            let mut buf = [0u8; 1];
            self.peeked = match self.reader.read(&mut buf)? {
                0 => None,
                _ => Some(buf[0]),
            };
        }
        Ok(self.peeked)
    }

    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let b = self.peek_byte()?;
        self.peeked = None;
        if b == Some(b'\n') {
            self.line += 1;
        }
        Ok(b)
    }

    fn skip_whitespace(&mut self) -> io::Result<()> {
        while let Some(b) = self.peek_byte()? {
            if (b as char).is_whitespace() {
                self.next_byte()?;
            } else {
                break;
            }
        }
        Ok(())
    }

    fn read_while(&mut self, mut pred: impl FnMut(char) -> bool) -> io::Result<String> {
        let mut out = String::new();
        while let Some(b) = self.peek_byte()? {
            let c = b as char;
            if pred(c) {
                out.push(c);
                self.next_byte()?;
            } else {
                break;
            }
        }
        Ok(out)
    }

    fn read_header(&mut self) -> Result<Token, TokenizerError> {
        let line = self.line;
        self.next_byte()?; // consume '['
        self.skip_whitespace()?;
        let name = self.read_while(|c| c.is_ascii_alphanumeric() || c == '_')?;
        if name.is_empty() {
            return Err(TokenizerError::MalformedHeader(line));
        }
        self.skip_whitespace()?;

        match self.next_byte()? {
            Some(b'"') => {}
            _ => return Err(TokenizerError::MalformedHeader(line)),
        }

        let mut value = String::new();
        loop {
            match self.next_byte()? {
                None => return Err(TokenizerError::UnmatchedQuotes(line)),
                Some(b'"') => break,
                Some(b'\\') => match self.next_byte()? {
                    Some(b'"') => value.push('"'),
                    Some(b'\\') => value.push('\\'),
                    Some(other) => value.push(other as char),
                    None => return Err(TokenizerError::UnmatchedQuotes(line)),
                },
                Some(b) => value.push(b as char),
            }
        }

        self.skip_whitespace()?;
        if self.next_byte()? != Some(b']') {
            return Err(TokenizerError::MalformedHeader(line));
        }

        Ok(Token::Header(HeaderName::parse(&name), value.trim().to_string()))
    }

    fn read_brace_comment(&mut self) -> Result<Token, TokenizerError> {
        let line = self.line;
        self.next_byte()?; // consume '{'
        let mut text = String::new();
        loop {
            match self.next_byte()? {
                None => return Err(TokenizerError::UnterminatedComment(line)),
                Some(b'}') => break,
                Some(b) => text.push(b as char),
            }
        }
        Ok(Token::Comment(text.trim().to_string()))
    }

    fn read_rest_of_line_comment(&mut self) -> Result<Token, TokenizerError> {
        self.next_byte()?; // consume ';'
        let mut text = String::new();
        while let Some(b) = self.peek_byte()? {
            if b == b'\n' {
                break;
            }
            text.push(b as char);
            self.next_byte()?;
        }
        Ok(Token::RestOfLineComment(text.trim().to_string()))
    }

    fn read_digits_token(&mut self) -> Result<Token, TokenizerError> {
        let digits = self.read_while(|c| c.is_ascii_digit())?;
        match self.peek_byte()? {
            Some(b'.') => {
                self.next_byte()?;
                let mut dots = 1;
                while self.peek_byte()? == Some(b'.') {
                    self.next_byte()?;
                    dots += 1;
                }
                let num: u32 = digits.parse().unwrap_or(0);
                let color = if dots > 1 { Color::Black } else { Color::White };
                Ok(Token::MoveNumber(num, color))
            }
            Some(b'-') if digits == "1" || digits == "0" => {
                self.next_byte()?;
                let rest = self.read_while(|c| c.is_ascii_digit())?;
                Ok(Token::Result(format!("{digits}-{rest}")))
            }
            Some(b'/') if digits == "1" => {
                self.next_byte()?;
                let rest = self.read_while(|c| c.is_ascii_digit() || c == '-' || c == '/')?;
                Ok(Token::Result(format!("1/{rest}")))
            }
            _ => {
                // A bare number with no following '.'/'-'/'/' isn't valid
                // PGN; treat it as a degenerate move-number with no dots.
                let num: u32 = digits.parse().unwrap_or(0);
                Ok(Token::MoveNumber(num, Color::White))
            }
        }
    }

    /// Returns the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>, TokenizerError> {
        self.skip_whitespace()?;
        let line = self.line;
        let Some(b) = self.peek_byte()? else {
            return Ok(None);
        };
        let c = b as char;

        let token = match c {
            '[' => self.read_header()?,
            '{' => self.read_brace_comment()?,
            ';' => self.read_rest_of_line_comment()?,
            '(' => {
                self.next_byte()?;
                Token::VarStart
            }
            ')' => {
                self.next_byte()?;
                Token::VarEnd
            }
            '*' => {
                self.next_byte()?;
                Token::Result("*".to_string())
            }
            '$' => {
                self.next_byte()?;
                let digits = self.read_while(|c| c.is_ascii_digit())?;
                let value: u16 = digits
                    .parse()
                    .map_err(|_| TokenizerError::InvalidNag(line, digits.clone()))?;
                let value: u8 = value
                    .try_into()
                    .map_err(|_| TokenizerError::InvalidNag(line, digits))?;
                Token::Nag(value)
            }
            '!' | '?' => {
                let sym = self.read_while(|c| c == '!' || c == '?')?;
                Token::SymbolicEval(sym)
            }
            '0'..='9' => self.read_digits_token()?,
            c if c.is_ascii_alphabetic() => {
                let word = self.read_while(is_move_char)?;
                if word == "N" {
                    Token::SymbolicEval(word)
                } else {
                    Token::Move(word)
                }
            }
            other => {
                self.next_byte()?;
                return Err(TokenizerError::SpuriousChar(line, other));
            }
        };

        Ok(Some(token))
    }
}
