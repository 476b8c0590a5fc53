//! Text-format VDF (KeyValues) parser.
//!
//! Covers the subset Steam uses for `libraryfolders.vdf`: a single root
//! key, nested objects in braces, quoted or bare string tokens, and
//! `//` line comments.

use std::fs;
use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;

use crate::SteamError;

/// A parsed KeyValues node: either a string value or a nested object.
///
/// Objects preserve key order and may contain duplicate keys, as the
/// on-disk format allows both.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValues {
    String(String),
    Object(Vec<(String, KeyValues)>),
}

impl KeyValues {
    /// Returns the first child with the given key (case-insensitive).
    pub fn get(&self, key: &str) -> Option<&KeyValues> {
        match self {
            KeyValues::Object(pairs) => pairs
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v),
            KeyValues::String(_) => None,
        }
    }

    /// Returns the string value, if this node is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            KeyValues::String(s) => Some(s),
            KeyValues::Object(_) => None,
        }
    }

    /// Returns the child pairs, if this node is an object.
    pub fn entries(&self) -> Option<&[(String, KeyValues)]> {
        match self {
            KeyValues::Object(pairs) => Some(pairs),
            KeyValues::String(_) => None,
        }
    }
}

/// Loads and parses a VDF file, returning the root key and its object.
pub fn load_vdf(path: &Path) -> Result<(String, KeyValues), SteamError> {
    let content = fs::read_to_string(path)
        .map_err(|e| SteamError::Io(format!("failed to read {}: {e}", path.display())))?;
    parse(&content)
}

/// Parses VDF text into its root key and value.
pub fn parse(input: &str) -> Result<(String, KeyValues), SteamError> {
    let mut lexer = Lexer::new(input);

    let root_key = match lexer.next_token()? {
        Some(Token::Str(s)) => s,
        Some(other) => {
            return Err(SteamError::Vdf(format!(
                "expected root key, got {}",
                other.describe()
            )));
        }
        None => return Err(SteamError::Vdf("empty input".into())),
    };

    match lexer.next_token()? {
        Some(Token::Open) => {}
        Some(other) => {
            return Err(SteamError::Vdf(format!(
                "expected '{{' after root key, got {}",
                other.describe()
            )));
        }
        None => return Err(SteamError::Vdf("unexpected end of input after root key".into())),
    }

    let root = parse_object(&mut lexer)?;

    if let Some(extra) = lexer.next_token()? {
        return Err(SteamError::Vdf(format!(
            "trailing data after root object: {}",
            extra.describe()
        )));
    }

    Ok((root_key, KeyValues::Object(root)))
}

/// Parses object body pairs until the closing brace.
fn parse_object(lexer: &mut Lexer<'_>) -> Result<Vec<(String, KeyValues)>, SteamError> {
    let mut pairs = Vec::new();

    loop {
        let key = match lexer.next_token()? {
            Some(Token::Close) => return Ok(pairs),
            Some(Token::Str(s)) => s,
            Some(Token::Open) => {
                return Err(SteamError::Vdf("unexpected '{' where a key was expected".into()));
            }
            None => return Err(SteamError::Vdf("unterminated object".into())),
        };

        match lexer.next_token()? {
            Some(Token::Str(value)) => pairs.push((key, KeyValues::String(value))),
            Some(Token::Open) => {
                let nested = parse_object(lexer)?;
                pairs.push((key, KeyValues::Object(nested)));
            }
            Some(Token::Close) | None => {
                return Err(SteamError::Vdf(format!("missing value for key '{key}'")));
            }
        }
    }
}

enum Token {
    Str(String),
    Open,
    Close,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Str(s) => format!("string '{s}'"),
            Token::Open => "'{'".into(),
            Token::Close => "'}'".into(),
        }
    }
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, SteamError> {
        self.skip_whitespace_and_comments();

        let Some(&c) = self.chars.peek() else {
            return Ok(None);
        };

        match c {
            '{' => {
                self.chars.next();
                Ok(Some(Token::Open))
            }
            '}' => {
                self.chars.next();
                Ok(Some(Token::Close))
            }
            '"' => self.read_quoted().map(Some),
            _ => self.read_bare().map(Some),
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
                self.chars.next();
            }

            // Line comment: consume to end of line.
            let mut lookahead = self.chars.clone();
            if lookahead.next() == Some('/') && lookahead.next() == Some('/') {
                while !matches!(self.chars.peek(), Some('\n') | None) {
                    self.chars.next();
                }
                continue;
            }

            return;
        }
    }

    fn read_quoted(&mut self) -> Result<Token, SteamError> {
        self.chars.next(); // opening quote
        let mut s = String::new();

        loop {
            match self.chars.next() {
                Some('"') => return Ok(Token::Str(s)),
                Some('\\') => match self.chars.next() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some(c) => s.push(c),
                    None => {
                        return Err(SteamError::Vdf("unterminated escape in string".into()));
                    }
                },
                Some(c) => s.push(c),
                None => return Err(SteamError::Vdf(format!("unterminated string '{s}'"))),
            }
        }
    }

    fn read_bare(&mut self) -> Result<Token, SteamError> {
        let mut s = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || c == '{' || c == '}' || c == '"' {
                break;
            }
            s.push(c);
            self.chars.next();
        }
        Ok(Token::Str(s))
    }
}
