use super::{Block, Declaration, GROUPING_RULES, Rule, RuleKind};
use crate::error::{Error, ErrorKind, Result};
use cssparser::{ParseError, ParseErrorKind, Parser, ParserInput, Token};
use memchr::{memchr, memchr_iter, memmem, memrchr};
use std::borrow::Cow;
use std::ops::Range;

/// Where a rule prelude stopped.
enum Stop {
    /// At the `{` token starting at this offset. The block is not entered yet.
    Block(usize),
    /// After a `;`.
    Semicolon,
    /// At a stray `}`, which only the top level can see.
    Close(usize),
    /// At the end of the enclosing block or of the input.
    End,
}

/// Parses `source` into its rule tree. Spans are byte offsets into `source`.
pub(super) fn parse_stylesheet(source: &str) -> Result<Vec<Rule>> {
    let text = mask_line_comments(source);
    let mut input = ParserInput::new(&text);
    let mut parser = Parser::new(&mut input);
    RuleParser { text: &text }.rules(&mut parser)
}

/// Blanks out preprocessor line comments (`// ...`) as spaces, so the text
/// tokenizes as plain CSS while every byte offset stays where it was.
fn mask_line_comments(source: &str) -> Cow<'_, str> {
    if memmem::find(source.as_bytes(), b"//").is_none() {
        return Cow::Borrowed(source);
    }
    let mut text = source.to_string();
    // Tokens before the first comment do not depend on it, so each pass
    // finds the next comment in a correct token stream.
    while let Some(start) = first_line_comment(&text) {
        let end = memchr(b'\n', &text.as_bytes()[start..]).map_or(text.len(), |i| start + i);
        text.replace_range(start..end, &" ".repeat(end - start));
    }
    Cow::Owned(text)
}

/// Offset of the first `//` outside strings, comments, URLs and brackets.
fn first_line_comment(text: &str) -> Option<usize> {
    fn scan<'i>(parser: &mut Parser<'i, '_>) -> Option<usize> {
        let mut slash = None;
        loop {
            let start = parser.position().byte_index();
            let token = parser.next_including_whitespace_and_comments().ok()?.clone();
            match &token {
                Token::Delim('/') if slash.is_some_and(|slash| slash + 1 == start) => return slash,
                Token::CurlyBracketBlock => {
                    let found = parser.parse_nested_block(|block| Ok::<_, ParseError<'i, ()>>(scan(block)));
                    if let Ok(Some(offset)) = found {
                        return Some(offset);
                    }
                },
                _ => {},
            }
            slash = matches!(token, Token::Delim('/')).then_some(start);
        }
    }
    let mut input = ParserInput::new(text);
    scan(&mut Parser::new(&mut input))
}

/// 1-based line and column (in characters) of a byte offset.
fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let before = &text.as_bytes()[..offset];
    let line = memchr_iter(b'\n', before).count() + 1;
    let line_start = memrchr(b'\n', before).map_or(0, |i| i + 1);
    (line, text[line_start..offset].chars().count() + 1)
}

/// `true` if a quoted string token ends with its own, unescaped, quote.
fn is_closed_string(raw: &str) -> bool {
    let Some((&quote, rest)) = raw.as_bytes().split_first() else {
        return false;
    };
    match rest.split_last() {
        Some((&last, body)) if last == quote => body.iter().rev().take_while(|&&b| b == b'\\').count() % 2 == 0,
        _ => false,
    }
}

/// Builds [`Rule`] trees out of the token stream of `text`.
struct RuleParser<'s> {
    text: &'s str,
}

impl RuleParser<'_> {
    fn error_at(&self, offset: usize, reason: &'static str) -> Error {
        let (line, column) = line_column(self.text, offset);
        exn::Exn::from(ErrorKind::Parse { line, column, reason })
    }

    /// The next token and its start offset, or `None` at the end of the
    /// current block. Unterminated strings and comments are errors.
    fn next<'i>(&self, parser: &mut Parser<'i, '_>) -> Result<Option<(usize, Token<'i>)>> {
        let start = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => return Ok(None),
        };
        let offset = start.byte_index();
        let raw = parser.slice_from(start);
        match token {
            Token::Comment(_) if raw.len() < 4 || !raw.ends_with("*/") => {
                Err(self.error_at(offset, "unterminated comment"))
            },
            Token::BadString(_) => Err(self.error_at(offset, "unterminated string")),
            Token::QuotedString(_) if !is_closed_string(raw) => Err(self.error_at(offset, "unterminated string")),
            token => Ok(Some((offset, token))),
        }
    }

    /// Runs `f` inside the block opened by the token just read at `open`,
    /// also reporting whether the block was closed before the end of input.
    fn nested<'i, T>(
        &self,
        parser: &mut Parser<'i, '_>,
        open: usize,
        f: impl for<'tt> FnOnce(&mut Parser<'i, 'tt>) -> Result<T>,
    ) -> Result<(T, bool)> {
        let mut end = open;
        let value = parser
            .parse_nested_block(|block| match f(block) {
                Ok(value) => {
                    end = block.position().byte_index();
                    Ok(value)
                },
                Err(err) => Err(block.new_custom_error(err)),
            })
            .map_err(|err: ParseError<'i, Error>| match err.kind {
                ParseErrorKind::Custom(err) => err,
                ParseErrorKind::Basic(_) => self.error_at(open, "malformed block"),
            })?;
        // A closed block leaves the parser past its closing delimiter.
        Ok((value, parser.position().byte_index() > end))
    }

    /// Like [`nested`](Self::nested), for a `{ ... }` block that must be closed.
    fn block<'i, T>(
        &self,
        parser: &mut Parser<'i, '_>,
        open: usize,
        f: impl for<'tt> FnOnce(&mut Parser<'i, 'tt>) -> Result<T>,
    ) -> Result<T> {
        match self.nested(parser, open, f)? {
            (value, true) => Ok(value),
            (_, false) => Err(self.error_at(open, "missing '}'")),
        }
    }

    /// Consumes the rest of the current block.
    fn skip(&self, parser: &mut Parser<'_, '_>) -> Result<()> {
        while let Some((offset, token)) = self.next(parser)? {
            self.skip_token(parser, offset, &token)?;
        }
        Ok(())
    }

    /// Consumes the block `token` opens, if it opens one.
    fn skip_token(&self, parser: &mut Parser<'_, '_>, offset: usize, token: &Token<'_>) -> Result<()> {
        match token {
            Token::CurlyBracketBlock => self.block(parser, offset, |block| self.skip(block)),
            Token::Function(_) | Token::ParenthesisBlock | Token::SquareBracketBlock => {
                self.nested(parser, offset, |block| self.skip(block)).map(|_| ())
            },
            _ => Ok(()),
        }
    }

    /// Consumes a rule prelude, starting with the already read `current`.
    fn prelude<'i>(&self, parser: &mut Parser<'i, '_>, mut current: Option<(usize, Token<'i>)>) -> Result<Stop> {
        // Offset just past a `#`, where a `{` is preprocessor interpolation.
        let mut hash_end = None;
        while let Some((offset, token)) = current {
            match &token {
                Token::CurlyBracketBlock if hash_end == Some(offset) => self.skip_token(parser, offset, &token)?,
                Token::CurlyBracketBlock => return Ok(Stop::Block(offset)),
                Token::Semicolon => return Ok(Stop::Semicolon),
                Token::CloseCurlyBracket => return Ok(Stop::Close(offset)),
                _ => self.skip_token(parser, offset, &token)?,
            }
            hash_end = matches!(token, Token::Delim('#')).then(|| parser.position().byte_index());
            current = self.next(parser)?;
        }
        Ok(Stop::End)
    }

    /// Parses rules until the end of the current block.
    fn rules(&self, parser: &mut Parser<'_, '_>) -> Result<Vec<Rule>> {
        let mut rules = Vec::new();
        while let Some((start, token)) = self.next(parser)? {
            match token {
                Token::WhiteSpace(_) | Token::Comment(_) | Token::CDO | Token::CDC | Token::Semicolon => {},
                Token::CloseCurlyBracket => return Err(self.error_at(start, "unexpected '}'")),
                Token::AtKeyword(name) => rules.push(self.at_rule(parser, start, &name)?),
                token => rules.push(self.qualified_rule(parser, start, token)?),
            }
        }
        Ok(rules)
    }

    fn qualified_rule<'i>(&self, parser: &mut Parser<'i, '_>, start: usize, first: Token<'i>) -> Result<Rule> {
        match self.prelude(parser, Some((start, first)))? {
            Stop::Block(open) => {
                let declarations = self.block(parser, open, |block| self.declarations(block))?;
                Ok(Rule {
                    kind: RuleKind::Style,
                    span: start..parser.position().byte_index(),
                    block: Some(Block::Declarations(declarations)),
                })
            },
            Stop::Semicolon => {
                Ok(Rule { kind: RuleKind::Other, span: start..parser.position().byte_index(), block: None })
            },
            Stop::Close(_) | Stop::End => Err(self.error_at(start, "missing '{'")),
        }
    }

    fn at_rule(&self, parser: &mut Parser<'_, '_>, start: usize, name: &str) -> Result<Rule> {
        let name = name.to_ascii_lowercase();
        let first = self.next(parser)?;
        let block = match self.prelude(parser, first)? {
            Stop::Block(open) => Some(match name.as_str() {
                "font-face" | "page" => Block::Declarations(self.block(parser, open, |block| self.declarations(block))?),
                grouping if GROUPING_RULES.contains(&grouping) => {
                    Block::Rules(self.block(parser, open, |block| self.rules(block))?)
                },
                _ => {
                    self.block(parser, open, |block| self.skip(block))?;
                    Block::Opaque
                },
            }),
            // A statement at-rule, possibly ended by the enclosing block.
            Stop::Semicolon | Stop::End => None,
            Stop::Close(offset) => return Err(self.error_at(offset, "unexpected '}'")),
        };
        let kind = match name.as_str() {
            "font-face" => RuleKind::FontFace,
            _ => RuleKind::AtRule(name),
        };
        Ok(Rule { kind, span: start..parser.position().byte_index(), block })
    }

    /// Declarations of the current block. Nested rules and at-rules are
    /// skipped.
    fn declarations(&self, parser: &mut Parser<'_, '_>) -> Result<Vec<Declaration>> {
        let mut declarations = Vec::new();
        while let Some((start, token)) = self.next(parser)? {
            match token {
                Token::WhiteSpace(_) | Token::Comment(_) | Token::Semicolon => {},
                Token::AtKeyword(_) => {
                    let first = self.next(parser)?;
                    if let Stop::Block(open) = self.prelude(parser, first)? {
                        self.block(parser, open, |block| self.skip(block))?;
                    }
                },
                token => {
                    if let Some(declaration) = self.declaration(parser, start, token)? {
                        declarations.push(declaration);
                    }
                },
            }
        }
        Ok(declarations)
    }

    /// Reads one `property: value` pair starting with `first`. Returns `None`
    /// for a nested rule (`&:hover { ... }`) or text without a property.
    fn declaration<'i>(
        &self,
        parser: &mut Parser<'i, '_>,
        start: usize,
        first: Token<'i>,
    ) -> Result<Option<Declaration>> {
        let mut colon = None;
        let mut value: Option<Range<usize>> = None;
        let mut hash_end = None;
        let mut current = Some((start, first));
        while let Some((offset, token)) = current {
            match &token {
                Token::CurlyBracketBlock if hash_end != Some(offset) => {
                    self.block(parser, offset, |block| self.skip(block))?;
                    return Ok(None);
                },
                Token::Semicolon => break,
                Token::Colon if colon.is_none() => colon = Some(offset),
                Token::WhiteSpace(_) | Token::Comment(_) => {},
                _ => {
                    self.skip_token(parser, offset, &token)?;
                    if colon.is_some() {
                        let end = parser.position().byte_index();
                        value = Some(value.map_or(offset, |span| span.start)..end);
                    }
                },
            }
            hash_end = matches!(token, Token::Delim('#')).then(|| parser.position().byte_index());
            current = self.next(parser)?;
        }

        let Some(colon) = colon else {
            return Ok(None);
        };
        let property = self.text[start..colon].trim();
        if property.is_empty() {
            return Ok(None);
        }
        let value_span = value.unwrap_or(colon + 1..colon + 1);
        Ok(Some(Declaration {
            property: property.to_string(),
            value: self.text[value_span.clone()].to_string(),
            value_span,
            modified: false,
        }))
    }
}
