use logos::{Logos, SpannedIter};

use crate::error::ParseError;

pub(super) struct Token {
    pub(super) kind: TokenKind,
    pub(super) span: logos::Span,
}

pub(super) struct TokenIter<'a> {
    iter: SpannedIter<'a, LogosTokenKind>,
}

impl<'a> TokenIter<'a> {
    pub(super) fn new(input: &'a str) -> Self {
        Self {
            iter: LogosTokenKind::lexer(input).spanned(),
        }
    }
}

impl<'a> Iterator for TokenIter<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let (kind, span) = match self.iter.next()? {
            (Ok(LogosTokenKind::QuotedString), span) => {
                (TokenKind::String, (span.start + 1)..(span.end - 1))
            }
            (Ok(kind), span) => {
                let kind = match kind {
                    LogosTokenKind::LParen => TokenKind::LParen,
                    LogosTokenKind::RParen => TokenKind::RParen,
                    LogosTokenKind::Quote => TokenKind::Quote,
                    LogosTokenKind::Atom => TokenKind::Atom,
                    LogosTokenKind::QuotedString | LogosTokenKind::WS => unreachable!(),
                };
                (kind, span)
            }
            (Err(_), span) => (TokenKind::Error, span),
        };
        Some(Token { kind, span })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum TokenKind {
    LParen,
    RParen,
    Quote,
    /// Quoted string, span excludes the quotes and escapes are still in place
    String,
    Atom,
    Error,
}

#[derive(Logos, Clone, Copy, Debug, PartialEq, Eq)]
enum LogosTokenKind {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("'")]
    Quote,
    #[regex(r#""([^"\\]|\\([^"\\]|["\\]))*""#)]
    QuotedString,
    #[regex(r#"[^()"' \t\r\n\x0B\x0C]+"#)]
    Atom,
    #[regex(r"[ \t\r\n\x0B\x0C]+", logos::skip)]
    WS,
}

/// Explain a lexer error found at byte `at`.
///
/// Every character outside a string starts some token, so the lexer only fails
/// on a `"` that never finds its closing quote.
pub(super) fn lex_error(input: &str, at: usize) -> ParseError {
    let rest = &input[at..];
    if !rest.starts_with('"') {
        return ParseError::InvalidToken { at };
    }
    let mut chars = rest.char_indices().skip(1);
    while let Some((offset, c)) = chars.next() {
        if c == '\\' && chars.next().is_none() {
            return ParseError::DanglingEscape { at: at + offset };
        }
    }
    ParseError::UnterminatedString { at }
}

/// Drop the backslash of every escape pair, keeping the escaped character verbatim.
pub(super) fn unescape(raw: &str) -> std::borrow::Cow<'_, str> {
    if !raw.contains('\\') {
        return raw.into();
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            c => out.push(c),
        }
    }
    out.into()
}
