mod cursor;
mod token;
mod token_kind;

use crate::error::DiagnosticData;
use crate::limit::LimitTracker;
use crate::Error;

use cursor::{Cursor, EOF_CHAR};

pub use token::Token;
pub use token_kind::TokenKind;

/// Parses tokens into text.
///
/// The lexer is an iterator of `Result<Token, Error>`: lexical errors are
/// yielded in stream order so the parser can report them with everything
/// else. Whitespace and comments are consumed silently. The stream ends with
/// one `Eof` token.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    index: usize,
    finished: bool,
    pub(crate) limit_tracker: LimitTracker,
}

impl<'a> Lexer<'a> {
    /// Create a lexer for an input string.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            index: 0,
            finished: false,
            limit_tracker: LimitTracker::new(usize::MAX),
        }
    }

    /// Abort lexing after `limit` tokens.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit_tracker = LimitTracker::new(limit);
        self
    }

    /// Lex the whole input, splitting tokens and errors.
    pub fn lex(self) -> (Vec<Token<'a>>, Vec<Error>) {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();
        for result in self {
            match result {
                Ok(token) => tokens.push(token),
                Err(error) => errors.push(error),
            }
        }
        (tokens, errors)
    }

    /// Skip whitespace and comments. Returns an error for a comment that is
    /// never closed, consuming the rest of the input.
    fn skip_trivia(&mut self) -> Option<Error> {
        loop {
            let trimmed = self.input.trim_start_matches(char::is_whitespace);
            self.index += self.input.len() - trimmed.len();
            self.input = trimmed;

            if self.input.starts_with("//") {
                let len = self.input.find('\n').map_or(self.input.len(), |i| i + 1);
                self.input = &self.input[len..];
                self.index += len;
                continue;
            }
            if self.input.starts_with("/*") {
                match self.input[2..].find("*/") {
                    Some(i) => {
                        let len = 2 + i + 2;
                        self.input = &self.input[len..];
                        self.index += len;
                        continue;
                    }
                    None => {
                        let error = Error::new(
                            DiagnosticData::UnterminatedComment,
                            "/*".to_string(),
                            self.index,
                        );
                        self.index += self.input.len();
                        self.input = "";
                        return Some(error);
                    }
                }
            }
            return None;
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if let Some(error) = self.skip_trivia() {
            return Some(Err(error));
        }
        if self.input.is_empty() {
            self.finished = true;
            return Some(Ok(Token::eof(self.index)));
        }
        if self.limit_tracker.check_and_increment() {
            self.finished = true;
            return Some(Err(Error::new(
                DiagnosticData::TokenLimitReached,
                String::new(),
                self.index,
            )));
        }

        let mut cursor = Cursor::new(self.input);
        let scanned = advance(&mut cursor);
        let len = cursor.len_consumed();
        let data = &self.input[..len];
        let index = self.index;
        self.input = &self.input[len..];
        self.index += len;

        Some(match scanned {
            Ok(TokenKind::Ident) => {
                let kind = TokenKind::keyword(data).unwrap_or(TokenKind::Ident);
                Ok(Token::new(kind, data, index))
            }
            Ok(kind) => Ok(Token::new(kind, data, index)),
            Err(code) => Err(Error::new(code, data.to_string(), index)),
        })
    }
}

fn advance(cursor: &mut Cursor<'_>) -> Result<TokenKind, DiagnosticData> {
    let first = cursor.bump().unwrap_or(EOF_CHAR);

    let kind = match first {
        c if is_ident_start(c) => {
            cursor.eat_while(is_ident_continue);
            TokenKind::Ident
        }
        c if c.is_ascii_digit() => return number(cursor, false),
        '.' if cursor.first().is_ascii_digit() => return number(cursor, true),
        '\'' => return char_literal(cursor),
        '"' => return string_literal(cursor),

        '(' => TokenKind::LParen,
        ')' => TokenKind::RParen,
        '[' => TokenKind::LBracket,
        ']' => TokenKind::RBracket,
        '{' => TokenKind::LBrace,
        '}' => TokenKind::RBrace,
        ';' => TokenKind::Semicolon,
        ',' => TokenKind::Comma,
        ':' => TokenKind::Colon,
        '?' => TokenKind::Question,
        '~' => TokenKind::Tilde,
        '.' => TokenKind::Dot,

        '+' => {
            if cursor.eatc('+') {
                TokenKind::PlusPlus
            } else if cursor.eatc('=') {
                TokenKind::PlusAssign
            } else {
                TokenKind::Plus
            }
        }
        '-' => {
            if cursor.eatc('-') {
                TokenKind::MinusMinus
            } else if cursor.eatc('=') {
                TokenKind::MinusAssign
            } else if cursor.eatc('>') {
                TokenKind::Arrow
            } else {
                TokenKind::Minus
            }
        }
        '*' => {
            if cursor.eatc('=') {
                TokenKind::StarAssign
            } else {
                TokenKind::Star
            }
        }
        '/' => {
            if cursor.eatc('=') {
                TokenKind::SlashAssign
            } else {
                TokenKind::Slash
            }
        }
        '%' => {
            if cursor.eatc('=') {
                TokenKind::PercentAssign
            } else {
                TokenKind::Percent
            }
        }
        '&' => {
            if cursor.eatc('&') {
                TokenKind::AmpAmp
            } else if cursor.eatc('=') {
                TokenKind::AmpAssign
            } else {
                TokenKind::Amp
            }
        }
        '|' => {
            if cursor.eatc('|') {
                TokenKind::PipePipe
            } else if cursor.eatc('=') {
                TokenKind::PipeAssign
            } else {
                TokenKind::Pipe
            }
        }
        '^' => {
            if cursor.eatc('=') {
                TokenKind::CaretAssign
            } else {
                TokenKind::Caret
            }
        }
        '=' => {
            if cursor.eatc('=') {
                TokenKind::EqEq
            } else {
                TokenKind::Assign
            }
        }
        '!' => {
            if cursor.eatc('=') {
                TokenKind::NotEq
            } else {
                TokenKind::Bang
            }
        }
        '<' => {
            if cursor.eatc('<') {
                if cursor.eatc('=') {
                    TokenKind::ShlAssign
                } else {
                    TokenKind::Shl
                }
            } else if cursor.eatc('=') {
                TokenKind::LtEq
            } else {
                TokenKind::Lt
            }
        }
        '>' => {
            if cursor.eatc('>') {
                if cursor.eatc('=') {
                    TokenKind::ShrAssign
                } else {
                    TokenKind::Shr
                }
            } else if cursor.eatc('=') {
                TokenKind::GtEq
            } else {
                TokenKind::Gt
            }
        }

        c => return Err(DiagnosticData::UnexpectedCharacter { c }),
    };

    Ok(kind)
}

fn number(cursor: &mut Cursor<'_>, leading_dot: bool) -> Result<TokenKind, DiagnosticData> {
    let mut is_float = leading_dot;

    cursor.eat_while(|c| c.is_ascii_digit());
    if !leading_dot && cursor.first() == '.' {
        is_float = true;
        cursor.bump();
        cursor.eat_while(|c| c.is_ascii_digit());
    }
    if matches!(cursor.first(), 'e' | 'E') {
        is_float = true;
        cursor.bump();
        if matches!(cursor.first(), '+' | '-') {
            cursor.bump();
        }
        if !cursor.first().is_ascii_digit() {
            cursor.eat_while(is_ident_continue);
            return Err(DiagnosticData::MalformedNumber);
        }
        cursor.eat_while(|c| c.is_ascii_digit());
    }
    // A literal running straight into identifier characters is one bad
    // token, not two tokens.
    if is_ident_start(cursor.first()) {
        cursor.eat_while(is_ident_continue);
        return Err(DiagnosticData::MalformedNumber);
    }

    Ok(if is_float {
        TokenKind::FloatLiteral
    } else {
        TokenKind::IntLiteral
    })
}

fn char_literal(cursor: &mut Cursor<'_>) -> Result<TokenKind, DiagnosticData> {
    match cursor.first() {
        '\'' => {
            cursor.bump();
            return Err(DiagnosticData::EmptyChar);
        }
        '\n' => return Err(DiagnosticData::UnterminatedChar),
        _ if cursor.is_eof() => return Err(DiagnosticData::UnterminatedChar),
        '\\' => {
            cursor.bump();
            let escape = cursor.bump().unwrap_or(EOF_CHAR);
            if !is_escape(escape) {
                cursor.eatc('\'');
                return Err(DiagnosticData::InvalidEscape { c: escape });
            }
        }
        _ => {
            cursor.bump();
        }
    }

    if cursor.eatc('\'') {
        Ok(TokenKind::CharLiteral)
    } else {
        Err(DiagnosticData::UnterminatedChar)
    }
}

fn string_literal(cursor: &mut Cursor<'_>) -> Result<TokenKind, DiagnosticData> {
    let mut pending = None;
    loop {
        if cursor.is_eof() || cursor.first() == '\n' {
            return Err(DiagnosticData::UnterminatedString);
        }
        match cursor.first() {
            '"' => {
                cursor.bump();
                return match pending {
                    Some(code) => Err(code),
                    None => Ok(TokenKind::StringLiteral),
                };
            }
            '\\' => {
                cursor.bump();
                let escape = cursor.bump().unwrap_or(EOF_CHAR);
                if !is_escape(escape) && pending.is_none() {
                    pending = Some(DiagnosticData::InvalidEscape { c: escape });
                }
            }
            _ => {
                cursor.bump();
            }
        }
    }
}

pub(crate) fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

pub(crate) fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

fn is_escape(c: char) -> bool {
    matches!(c, 'n' | 't' | 'r' | '0' | '\\' | '\'' | '"')
}
