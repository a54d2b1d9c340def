use crate::lexer::TokenKind;
use ordered_float::OrderedFloat;
use std::fmt;

/// A token produced by the lexer: its kind, the source text it covers, and
/// the byte index where that text begins.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub(crate) kind: TokenKind,
    pub(crate) data: &'a str,
    pub(crate) index: usize,
}

impl<'a> Token<'a> {
    pub(crate) fn new(kind: TokenKind, data: &'a str, index: usize) -> Self {
        Self { kind, data, index }
    }

    pub(crate) fn eof(index: usize) -> Self {
        Self {
            kind: TokenKind::Eof,
            data: "",
            index,
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// The source text of the token.
    pub fn data(&self) -> &'a str {
        self.data
    }

    /// The byte index this token starts at.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The byte index just past this token.
    pub fn end(&self) -> usize {
        self.index + self.data.len()
    }

    /// The value of an integer literal, `None` when it does not fit.
    pub fn int_value(&self) -> Option<i64> {
        self.data.parse().ok()
    }

    /// The value of a float literal.
    pub fn float_value(&self) -> OrderedFloat<f64> {
        OrderedFloat(self.data.parse().unwrap_or(0.0))
    }

    /// The value of a character literal, with its escape decoded.
    pub fn char_value(&self) -> Option<char> {
        let inner = self.data.strip_prefix('\'')?;
        let inner = inner.strip_suffix('\'').unwrap_or(inner);
        let mut chars = inner.chars();
        let c = match chars.next()? {
            '\\' => decode_escape(chars.next()?),
            c => c,
        };
        Some(c)
    }

    /// The contents of a string literal, with quotes stripped and escapes
    /// decoded.
    pub fn string_value(&self) -> String {
        let inner = self
            .data
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(self.data);
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                if let Some(e) = chars.next() {
                    out.push(decode_escape(e));
                }
            } else {
                out.push(c);
            }
        }
        out
    }
}

fn decode_escape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        other => other,
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}@{}:{} {:?}",
            self.kind,
            self.index,
            self.end(),
            self.data
        )
    }
}
