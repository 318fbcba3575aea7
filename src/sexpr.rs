use std::{borrow::Cow, fmt::Display};

use crate::error::ParseError;

mod lexer;
mod parser;

/// A node of a parsed S-expression.
///
/// Atoms always borrow from the parsed text. Strings borrow too unless they
/// contained escapes.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum SExpr<'a> {
    List(Box<[SExpr<'a>]>),
    Atom(&'a str),
    String(Cow<'a, str>),
}

/// Children are dropped from an explicit worklist so that the depth of the
/// tree is not limited by the call stack.
impl Drop for SExpr<'_> {
    fn drop(&mut self) {
        let SExpr::List(children) = self else {
            return;
        };
        if children.iter().all(|child| child.items().is_empty()) {
            return;
        }
        let mut pending = std::mem::take(children).into_vec();
        while let Some(mut node) = pending.pop() {
            if let SExpr::List(children) = &mut node {
                pending.extend(std::mem::take(children).into_vec());
            }
        }
    }
}

impl<'a> Display for SExpr<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SExpr::List(children) => {
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
            SExpr::Atom(s) => write!(f, "{}", s),
            SExpr::String(s) => {
                write!(f, "\"")?;
                for c in s.chars() {
                    if c == '"' || c == '\\' {
                        write!(f, "\\")?;
                    }
                    write!(f, "{}", c)?;
                }
                write!(f, "\"")
            }
        }
    }
}

impl<'a> SExpr<'a> {
    pub fn as_list(&self) -> Option<&[SExpr<'a>]> {
        match self {
            SExpr::List(children) => Some(children),
            _ => None,
        }
    }

    /// Children of a list, or nothing for atoms and strings
    pub fn items(&self) -> &[SExpr<'a>] {
        self.as_list().unwrap_or_default()
    }

    pub fn get(&self, index: usize) -> Option<&SExpr<'a>> {
        self.items().get(index)
    }

    /// Text of an atom or string
    pub fn text(&self) -> Option<&str> {
        match self {
            SExpr::Atom(s) => Some(s),
            SExpr::String(s) => Some(s),
            SExpr::List(_) => None,
        }
    }

    /// The text of the first child, which names the node
    pub fn key(&self) -> Option<&str> {
        self.get(0)?.text()
    }

    fn context(&self) -> String {
        self.key().unwrap_or_default().to_owned()
    }

    /// Child lists whose key is `label`, skipping the node's own head
    pub fn children<'b, 'c>(&'b self, label: &'c str) -> LabeledChildIterator<'a, 'b, 'c> {
        let iter = self.items().get(1..).unwrap_or_default().iter();
        LabeledChildIterator { iter, label }
    }

    /// First child list whose key is `label`, if any
    pub fn find(&self, label: &str) -> Option<&SExpr<'a>> {
        self.children(label).next()
    }

    /// First child list whose key is `label`
    pub fn child(&self, label: &str) -> Result<&SExpr<'a>, ParseError> {
        self.find(label).ok_or_else(|| ParseError::MissingField {
            key: label.to_owned(),
            context: self.context(),
        })
    }

    /// First child list whose key is `label` and whose second element is `sublabel`
    pub fn child_with(&self, label: &str, sublabel: &str) -> Option<&SExpr<'a>> {
        self.children(label)
            .find(|child| child.get(1).and_then(SExpr::text) == Some(sublabel))
    }

    /// Text of the element at `index`
    pub fn text_at(&self, index: usize) -> Result<&str, ParseError> {
        self.get(index)
            .and_then(SExpr::text)
            .ok_or_else(|| ParseError::UnexpectedNode {
                expected: format!("a text value at position {index}"),
                context: self.context(),
            })
    }

    /// The element at `index` read as a floating point number
    pub fn number_at(&self, index: usize) -> Result<f64, ParseError> {
        let text = self.text_at(index)?;
        text.parse().map_err(|_| ParseError::InvalidNumber {
            value: text.to_owned(),
            context: self.context(),
        })
    }

    /// Text following the key of the child list `label`, as in `(label value)`
    pub fn value(&self, label: &str) -> Result<&str, ParseError> {
        self.child(label)?
            .text_at(1)
            .map_err(|e| e.within(&self.context()))
    }
}

#[derive(Debug)]
pub struct LabeledChildIterator<'a, 'b, 'c> {
    iter: std::slice::Iter<'b, SExpr<'a>>,
    label: &'c str,
}

impl<'a, 'b, 'c> Iterator for LabeledChildIterator<'a, 'b, 'c> {
    type Item = &'b SExpr<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let label = self.label;
        self.iter.by_ref().find(|child| child.key() == Some(label))
    }
}

impl<'a> TryFrom<&'a String> for SExpr<'a> {
    type Error = ParseError;

    fn try_from(input: &'a String) -> Result<Self, Self::Error> {
        SExpr::try_from(input.as_str())
    }
}
