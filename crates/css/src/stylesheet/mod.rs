//! A minimal, span-preserving stylesheet tree.
//!
//! [`Stylesheet::parse`] records *where* every rule and declaration lives in
//! the source text instead of re-tokenizing it into values. Serializing (via
//! [`Display`]) copies the original bytes verbatim and splices in only the
//! declaration values that were changed through [`Declaration::set_value`],
//! so rules nobody touched come back byte-for-byte identical.
//!
//! Tokenizing is done by `cssparser`, so escapes, strings, comments and
//! nested blocks follow CSS Syntax Level 3. On top of that the parser accepts
//! preprocessor line comments (`//`, as found in `.scss` and `.less`) and
//! `#{...}` interpolation. It does not validate selectors, properties or
//! values.

mod parse;

use crate::error::Result;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::ops::Range;

/// At-rules whose block holds further rules rather than declarations.
pub(crate) const GROUPING_RULES: [&str; 8] =
    ["media", "supports", "layer", "container", "document", "-moz-document", "scope", "starting-style"];

/// What kind of rule a [`Rule`] node is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleKind {
    /// `@font-face { ... }`
    FontFace,
    /// A qualified rule: `selector { declarations }`.
    Style,
    /// Any other at-rule; holds the lowercase name without the `@`.
    AtRule(String),
    /// A top-level statement that is not an at-rule, such as a preprocessor
    /// variable assignment (`$accent: #f00;`).
    Other,
}

/// The contents of a rule's `{ ... }` block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    Declarations(Vec<Declaration>),
    Rules(Vec<Rule>),
    /// A block whose contents are kept as-is (e.g. `@keyframes`).
    Opaque,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    pub kind: RuleKind,
    /// Byte range of the whole rule, prelude through closing brace or semicolon.
    pub span: Range<usize>,
    /// `None` for statement rules such as `@import url(a.css);`.
    pub block: Option<Block>,
}

impl Rule {
    /// Declarations of this rule, in source order. Empty for rules without a
    /// declaration block.
    pub fn declarations(&self) -> &[Declaration] {
        match &self.block {
            Some(Block::Declarations(declarations)) => declarations,
            _ => &[],
        }
    }

    pub fn declarations_mut(&mut self) -> &mut [Declaration] {
        match &mut self.block {
            Some(Block::Declarations(declarations)) => declarations,
            _ => &mut [],
        }
    }
}

/// A `property: value` pair inside a declaration block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    property: String,
    value: String,
    /// Byte range of the (trimmed) value in the source text.
    value_span: Range<usize>,
    modified: bool,
}

impl Declaration {
    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replaces the value; the new text is spliced in on serialization.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.modified = true;
    }
}

/// A parsed stylesheet borrowing its source text.
///
/// # Example
///
/// ```
/// use f2b_css::{RuleKind, Stylesheet};
///
/// # fn main() -> f2b_css::error::Result<()> {
/// let css = "body { color: red }\n@font-face { src: url(a.woff) }";
/// let mut sheet = Stylesheet::parse(css)?;
/// sheet.for_each_rule_mut(|rule| {
///     if rule.kind == RuleKind::FontFace {
///         rule.declarations_mut()[0].set_value("url(b.woff)");
///     }
/// });
/// assert_eq!(sheet.to_string(), "body { color: red }\n@font-face { src: url(b.woff) }");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Stylesheet<'a> {
    source: &'a str,
    rules: Vec<Rule>,
}

impl<'a> Stylesheet<'a> {
    /// Parses `source` into a rule tree.
    ///
    /// # Errors
    /// Returns [`Parse`](crate::error::ErrorKind::Parse) for structural
    /// problems: unterminated comments or strings, unbalanced braces, or a
    /// rule prelude that never opens a block.
    pub fn parse(source: &'a str) -> Result<Self> {
        let rules = parse::parse_stylesheet(source)?;
        Ok(Self { source, rules })
    }

    /// Top-level rules, in source order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Calls `f` on every rule in source order, descending into grouping
    /// rules such as `@media` and `@supports`.
    pub fn for_each_rule_mut(&mut self, mut f: impl FnMut(&mut Rule)) {
        fn walk(rules: &mut [Rule], f: &mut impl FnMut(&mut Rule)) {
            for rule in rules {
                f(rule);
                if let Some(Block::Rules(children)) = &mut rule.block {
                    walk(children, f);
                }
            }
        }
        walk(&mut self.rules, &mut f);
    }

    /// Serializes the stylesheet. Same as `to_string()`.
    pub fn to_css(&self) -> String {
        self.to_string()
    }

    /// Changed declaration values as `(span, replacement)`, in source order.
    fn edits(&self) -> Vec<(Range<usize>, &str)> {
        fn collect<'r>(rules: &'r [Rule], edits: &mut Vec<(Range<usize>, &'r str)>) {
            for rule in rules {
                match &rule.block {
                    Some(Block::Declarations(declarations)) => edits.extend(
                        declarations.iter().filter(|d| d.modified).map(|d| (d.value_span.clone(), d.value.as_str())),
                    ),
                    Some(Block::Rules(children)) => collect(children, edits),
                    Some(Block::Opaque) | None => {},
                }
            }
        }
        let mut edits = Vec::new();
        collect(&self.rules, &mut edits);
        edits
    }
}

impl Display for Stylesheet<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut cursor = 0;
        for (span, value) in self.edits() {
            f.write_str(&self.source[cursor..span.start])?;
            f.write_str(value)?;
            cursor = span.end;
        }
        f.write_str(&self.source[cursor..])
    }
}
