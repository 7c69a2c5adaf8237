//! Splits RFC 1035 master-file text into entries.
//!
//! An entry is one logical line: parentheses join physical lines, `;` starts
//! a comment running to the end of the line, and double quotes group
//! whitespace into a single token.

use crate::error_handling::ZoneError;

/// One logical line of a zone file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Entry {
    /// Line the entry starts on (1-based).
    pub line: usize,
    /// The entry started with whitespace, so it has no owner field.
    pub indented: bool,
    pub tokens: Vec<Token>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Token {
    pub text: String,
    pub quoted: bool,
}

impl Entry {
    pub fn first(&self) -> Option<&Token> {
        self.tokens.first()
    }
}

pub(super) struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    depth: usize,
    entries: Vec<Entry>,
    current: Option<Entry>,
    token: String,
    in_token: bool,
    line_indented: bool,
    entry_line: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
            depth: 0,
            entries: Vec::new(),
            current: None,
            token: String::new(),
            in_token: false,
            line_indented: false,
            entry_line: 1,
        }
    }

    /// Consumes the input and returns its non-empty entries.
    ///
    /// # Errors
    ///
    /// `ZoneError::Syntax` for unbalanced parentheses, unterminated quotes
    /// and dangling escapes.
    pub fn entries(mut self) -> Result<Vec<Entry>, ZoneError> {
        let mut line_start = true;

        while let Some(c) = self.chars.next() {
            match c {
                '\n' => {
                    self.end_token();
                    if self.depth == 0 {
                        self.end_entry();
                    }
                    self.line += 1;
                    line_start = true;
                    continue;
                }
                ' ' | '\t' | '\r' => {
                    if line_start && self.depth == 0 {
                        self.line_indented = true;
                    }
                    self.end_token();
                }
                ';' => {
                    self.end_token();
                    while self.chars.next_if(|&c| c != '\n').is_some() {}
                }
                '(' => {
                    self.end_token();
                    self.depth += 1;
                }
                ')' => {
                    self.end_token();
                    if self.depth == 0 {
                        return Err(self.syntax("unbalanced ')'"));
                    }
                    self.depth -= 1;
                }
                '"' => {
                    self.end_token();
                    let text = self.quoted()?;
                    self.push(Token { text, quoted: true });
                }
                '\\' => {
                    let escaped = self.escaped()?;
                    self.token.push('\\');
                    self.token.push(escaped);
                    self.in_token = true;
                }
                c => {
                    self.token.push(c);
                    self.in_token = true;
                }
            }

            if line_start && !matches!(c, ' ' | '\t' | '\r') {
                line_start = false;
            }
        }

        if self.depth > 0 {
            return Err(self.syntax("unbalanced '('"));
        }
        self.end_token();
        self.end_entry();
        Ok(self.entries)
    }

    fn quoted(&mut self) -> Result<String, ZoneError> {
        let mut text = String::new();
        loop {
            match self.chars.next() {
                Some('"') => return Ok(text),
                Some('\\') => {
                    let escaped = self.escaped()?;
                    text.push(escaped);
                }
                Some(c) => {
                    if c == '\n' {
                        self.line += 1;
                    }
                    text.push(c);
                }
                None => return Err(self.syntax("unterminated quoted string")),
            }
        }
    }

    fn escaped(&mut self) -> Result<char, ZoneError> {
        match self.chars.next() {
            Some('\n') | None => Err(self.syntax("dangling escape")),
            Some(c) => Ok(c),
        }
    }

    fn end_token(&mut self) {
        if self.in_token {
            let text = std::mem::take(&mut self.token);
            self.push(Token {
                text,
                quoted: false,
            });
            self.in_token = false;
        }
    }

    fn push(&mut self, token: Token) {
        if self.current.is_none() {
            self.entry_line = self.line;
        }
        let indented = self.line_indented;
        let line = self.entry_line;
        self.current
            .get_or_insert_with(|| Entry {
                line,
                indented,
                tokens: Vec::new(),
            })
            .tokens
            .push(token);
    }

    fn end_entry(&mut self) {
        if let Some(entry) = self.current.take() {
            self.entries.push(entry);
        }
        self.line_indented = false;
    }

    fn syntax(&self, message: &str) -> ZoneError {
        ZoneError::Syntax {
            line: self.line,
            message: message.to_string(),
        }
    }
}
