use crate::error::ParseError;

use super::{
    lexer::{lex_error, unescape, Token, TokenIter, TokenKind},
    SExpr,
};

/// A value that is still being read
#[derive(Debug)]
enum Frame<'a> {
    List { start: usize, items: Vec<SExpr<'a>> },
    /// A `'` prefix; the next complete value replaces it in the enclosing list
    Quote { at: usize },
}

/// Stack machine turning the token stream into a tree.
///
/// Nesting lives on `stack` rather than on the call stack, so deep input
/// cannot overflow it.
pub(super) struct Parser<'a> {
    input: &'a str,
    iter: TokenIter<'a>,
    stack: Vec<Frame<'a>>,
    /// The implicit top-level list
    root: Vec<SExpr<'a>>,
}

impl<'a> Parser<'a> {
    pub(super) fn new(input: &'a str) -> Self {
        Self {
            input,
            iter: TokenIter::new(input),
            stack: Vec::new(),
            root: Vec::new(),
        }
    }

    /// Append a finished value to whatever is on top of the stack, resolving
    /// any quote frames in between.
    fn complete(&mut self, value: SExpr<'a>, at: usize) -> Result<(), ParseError> {
        loop {
            match self.stack.last_mut() {
                Some(Frame::Quote { .. }) => {
                    self.stack.pop();
                }
                Some(Frame::List { items, .. }) => {
                    items.push(value);
                    return Ok(());
                }
                None if !self.root.is_empty() => return Err(ParseError::TrailingInput { at }),
                None if value.as_list().is_none() => return Err(ParseError::NotAList { at }),
                None => {
                    self.root.push(value);
                    return Ok(());
                }
            }
        }
    }

    fn close(&mut self, at: usize) -> Result<(), ParseError> {
        match self.stack.pop() {
            Some(Frame::List { start, items }) => {
                self.complete(SExpr::List(items.into()), start)
            }
            Some(Frame::Quote { at }) => Err(ParseError::DanglingQuote { at }),
            None => Err(ParseError::UnexpectedClose { at }),
        }
    }

    fn step(&mut self, token: Token) -> Result<(), ParseError> {
        let Token { kind, span } = token;
        match kind {
            TokenKind::LParen => {
                self.stack.push(Frame::List {
                    start: span.start,
                    items: Vec::new(),
                });
                Ok(())
            }
            TokenKind::RParen => self.close(span.start),
            TokenKind::Quote => {
                self.stack.push(Frame::Quote { at: span.start });
                Ok(())
            }
            TokenKind::Atom => {
                let atom = SExpr::Atom(&self.input[span.clone()]);
                self.complete(atom, span.start)
            }
            TokenKind::String => {
                // span excludes the opening quote
                let string = SExpr::String(unescape(&self.input[span.clone()]));
                self.complete(string, span.start - 1)
            }
            TokenKind::Error => Err(lex_error(self.input, span.start)),
        }
    }

    pub(super) fn parse(mut self) -> Result<SExpr<'a>, ParseError> {
        log::trace!("Parsing S-expression from {} bytes", self.input.len());
        while let Some(token) = self.iter.next() {
            self.step(token)?;
        }

        match self.stack.last() {
            None => {}
            Some(Frame::Quote { at }) => return Err(ParseError::DanglingQuote { at: *at }),
            Some(Frame::List { .. }) => {
                let depth = self
                    .stack
                    .iter()
                    .filter(|frame| matches!(frame, Frame::List { .. }))
                    .count();
                return Err(ParseError::UnclosedList { depth });
            }
        }

        let root = self.root.pop().ok_or(ParseError::Empty)?;
        log::trace!("Parsed S-expression with key {:?}", root.key());
        Ok(root)
    }
}

impl<'a> TryFrom<&'a str> for SExpr<'a> {
    type Error = ParseError;

    fn try_from(input: &'a str) -> Result<Self, Self::Error> {
        Parser::new(input).parse()
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ParseError;
    use crate::sexpr::SExpr;
    use rstest::*;

    fn atom(s: &str) -> SExpr<'_> {
        SExpr::Atom(s)
    }

    fn string(s: &str) -> SExpr<'_> {
        SExpr::String(s.into())
    }

    fn list<'a>(items: Vec<SExpr<'a>>) -> SExpr<'a> {
        SExpr::List(items.into())
    }

    #[rstest]
    #[case("(abc)", "(abc)")]
    #[case("(abc\n)", "(abc)")]
    #[case("( a\t(b  c)\r\n\"d e\" )", "(a (b c) \"d e\")")]
    #[case("()", "()")]
    #[case("(a '(b c) d)", "(a (b c) d)")]
    #[case("(a ''b)", "(a b)")]
    fn can_parse_sexpr(#[case] input: &str, #[case] expected: &str) {
        let sexpr = SExpr::try_from(input).unwrap();
        assert_eq!(&format!("{sexpr}"), expected);
    }

    #[test]
    fn quoted_values_are_spliced_into_the_parent() {
        let sexpr = SExpr::try_from(r#"(a b (c d) "e f" 'g)"#).unwrap();
        let expected = list(vec![
            atom("a"),
            atom("b"),
            list(vec![atom("c"), atom("d")]),
            string("e f"),
            atom("g"),
        ]);
        assert_eq!(sexpr, expected);
    }

    #[test]
    fn quoted_list_keeps_its_contents() {
        let sexpr = SExpr::try_from("(a '(b (c)))").unwrap();
        let expected = list(vec![
            atom("a"),
            list(vec![atom("b"), list(vec![atom("c")])]),
        ]);
        assert_eq!(sexpr, expected);
    }

    #[test]
    fn escaped_quote_stays_in_string() {
        let sexpr = SExpr::try_from(r#"("a\"b")"#).unwrap();
        assert_eq!(sexpr, list(vec![string("a\"b")]));
    }

    #[test]
    fn escaped_backslash_and_parens_in_string() {
        let sexpr = SExpr::try_from(r#"(x "a\\b" "(c)")"#).unwrap();
        let expected = list(vec![atom("x"), string(r"a\b"), string("(c)")]);
        assert_eq!(sexpr, expected);
    }

    #[test]
    fn atom_directly_before_string() {
        let sexpr = SExpr::try_from(r#"(a"b"c)"#).unwrap();
        let expected = list(vec![atom("a"), string("b"), atom("c")]);
        assert_eq!(sexpr, expected);
    }

    #[test]
    fn unescaped_strings_borrow_from_input() {
        let sexpr = SExpr::try_from(r#"("plain" "esc\"aped")"#).unwrap();
        let items = sexpr.items();
        assert!(matches!(&items[0], SExpr::String(std::borrow::Cow::Borrowed(_))));
        assert!(matches!(&items[1], SExpr::String(std::borrow::Cow::Owned(_))));
    }


    #[test]
    fn parsing_twice_gives_equal_trees() {
        let input = "(kicad_pcb (version 20171130) (module R (at 1 2 90)) \"x y\")";
        assert_eq!(SExpr::try_from(input), SExpr::try_from(input));
    }

    #[test]
    fn deep_nesting_does_not_recurse() {
        let depth = 100_000;
        let input = format!("{}x{}", "(".repeat(depth), ")".repeat(depth));
        let sexpr = SExpr::try_from(input.as_str()).unwrap();

        let mut levels = 1;
        let mut node = &sexpr;
        while let Some(SExpr::List(_)) = node.get(0) {
            node = &node.items()[0];
            levels += 1;
        }
        assert_eq!(levels, depth);
        assert_eq!(node.get(0), Some(&atom("x")));
        drop(sexpr);
    }

    #[test]
    fn deep_nesting_error_does_not_recurse() {
        let depth = 100_000;
        let input = format!("{}{}", "(".repeat(depth), ")".repeat(depth - 1));
        assert_eq!(
            SExpr::try_from(input.as_str()),
            Err(ParseError::UnclosedList { depth: 1 })
        );
    }

    #[rstest]
    #[case("(a (b)", ParseError::UnclosedList { depth: 1 })]
    #[case("((a", ParseError::UnclosedList { depth: 2 })]
    #[case("(a))", ParseError::UnexpectedClose { at: 3 })]
    #[case(")", ParseError::UnexpectedClose { at: 0 })]
    #[case("(a \"bc)", ParseError::UnterminatedString { at: 3 })]
    #[case("(a \"bc\\", ParseError::DanglingEscape { at: 6 })]
    #[case("(a ')", ParseError::DanglingQuote { at: 3 })]
    #[case("(a '", ParseError::DanglingQuote { at: 3 })]
    #[case("", ParseError::Empty)]
    #[case(" \n\t", ParseError::Empty)]
    #[case("(a) (b)", ParseError::TrailingInput { at: 4 })]
    #[case("  hello ", ParseError::NotAList { at: 2 })]
    #[case("\"text\"", ParseError::NotAList { at: 0 })]
    #[case("'a", ParseError::NotAList { at: 1 })]
    #[case("(a) b", ParseError::TrailingInput { at: 4 })]
    fn structural_errors(#[case] input: &str, #[case] expected: ParseError) {
        assert_eq!(SExpr::try_from(input), Err(expected));
    }
}
