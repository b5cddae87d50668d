use std::fmt;
use std::rc::Rc;

use crate::error::Error;
use crate::rule::{Rule, Semantics};
use crate::value::Value;

/// A node in a parse tree: witnesses that `span` is derivable as `category`.
///
/// Derivations are immutable once emitted. Nodes built by the chart parser
/// reference their originating rule; nodes emitted by sub-parsers carry
/// their own tag, category and semantics with no backing rule.
pub struct Derivation {
  pub tag: String,
  pub category: String,
  /// Verbatim substring of the original utterance covered by this node.
  pub span: String,
  pub children: Vec<Rc<Derivation>>,
  pub rule: Option<Rc<Rule>>,
  semantics: Semantics,
}

impl Derivation {
  /// A node produced by applying a grammar rule.
  pub fn from_rule(rule: &Rc<Rule>, span: String, children: Vec<Rc<Derivation>>) -> Self {
    Self {
      tag: rule.tag.clone(),
      category: rule.lhs.clone(),
      span,
      children,
      semantics: rule.semantics.clone(),
      rule: Some(rule.clone()),
    }
  }

  /// A free-standing node, as emitted by sub-parsers.
  pub fn new(
    tag: &str,
    category: &str,
    span: String,
    children: Vec<Rc<Derivation>>,
    semantics: Semantics,
  ) -> Self {
    Self {
      tag: tag.to_string(),
      category: category.to_string(),
      span,
      children,
      semantics,
      rule: None,
    }
  }

  pub fn is_leaf(&self) -> bool {
    self.children.is_empty()
  }

  /// Evaluates this subtree to a denotation, bottom-up. Recomputing is
  /// referentially transparent; semantics failures surface here and only
  /// here, as [`Error::Evaluation`].
  pub fn denotation(&self) -> Result<Value, Error> {
    let mut args = Vec::with_capacity(self.children.len());
    for child in self.children.iter() {
      args.push(child.denotation()?);
    }
    (self.semantics)(&args)
  }
}

impl fmt::Debug for Derivation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Derivation")
      .field("tag", &self.tag)
      .field("category", &self.category)
      .field("span", &self.span)
      .field("children", &self.children)
      .finish()
  }
}

impl fmt::Display for Derivation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_leaf() {
      write!(f, "({} '{}')", self.category, self.span)
    } else {
      write!(f, "({}", self.category)?;
      for child in self.children.iter() {
        write!(f, " {}", child)?;
      }
      write!(f, ")")
    }
  }
}
