//! Stylesheet parsing and `@font-face` `src` rewriting.
//!
//! [`Stylesheet`] is a small span-preserving parser: it knows where rules and
//! declarations sit in the source so that rewriting one value leaves every
//! other byte untouched. [`Rewriter`] builds on it to replace font URLs with
//! the data sources held in an [`f2b_fonts::DataUrlMap`].

pub mod error;
pub mod path;
mod rewrite;
mod stylesheet;
mod validator;

pub use crate::rewrite::{MAX_PATH_LENGTH, MatchMode, RewriteResult, Rewriter};
pub use crate::stylesheet::{Block, Declaration, Rule, RuleKind, Stylesheet};
pub use crate::validator::{StrictEquality, Validator};
