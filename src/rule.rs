use std::fmt;
use std::rc::Rc;

use crate::error::Error;
use crate::symbol::{is_nonterminal, is_optional, is_terminal, strip_optional};
use crate::value::Value;

/// A semantic callback: maps the denotations of a rule's children, in
/// right-hand-side order, to the rule's own denotation. Must be pure with
/// respect to its arguments.
pub type Semantics = Rc<dyn Fn(&[Value]) -> Result<Value, Error>>;

/// Wraps a closure into a [`Semantics`].
pub fn sem<F>(f: F) -> Semantics
where
  F: Fn(&[Value]) -> Result<Value, Error> + 'static,
{
  Rc::new(f)
}

/// Semantics returning the denotation of the child at `idx` unchanged.
pub fn project(idx: usize) -> Semantics {
  Rc::new(move |args: &[Value]| {
    args.get(idx).cloned().ok_or_else(|| {
      Error::Evaluation(format!(
        "projection index {} out of bounds for {} children",
        idx,
        args.len()
      ))
    })
  })
}

/// Semantics ignoring its children and returning a fixed value.
pub fn constant(value: Value) -> Semantics {
  Rc::new(move |_: &[Value]| Ok(value.clone()))
}

/// An author-level production rule.
///
/// `tag` is a free-form identifier used for featurization and debugging; it
/// is not required to be unique. `lhs` must be a non-terminal. `rhs` is a
/// non-empty sequence of symbols. Rules are immutable after construction and
/// shared behind `Rc`.
pub struct Rule {
  pub tag: String,
  pub lhs: String,
  pub rhs: Vec<String>,
  pub semantics: Semantics,
}

impl Rule {
  /// Builds a rule from a whitespace-separated rhs string.
  pub fn new(tag: &str, lhs: &str, rhs: &str, semantics: Semantics) -> Result<Self, Error> {
    Self::with_rhs(
      tag,
      lhs,
      rhs.split_whitespace().map(str::to_string).collect(),
      semantics,
    )
  }

  /// Builds a rule from an explicit rhs symbol sequence.
  pub fn with_rhs(
    tag: &str,
    lhs: &str,
    rhs: Vec<String>,
    semantics: Semantics,
  ) -> Result<Self, Error> {
    if !is_nonterminal(lhs) {
      return Err(Error::InvalidRule {
        tag: tag.to_string(),
        reason: format!("lhs `{}` is not a non-terminal", lhs),
      });
    }
    if rhs.is_empty() {
      return Err(Error::InvalidRule {
        tag: tag.to_string(),
        reason: "empty rhs".to_string(),
      });
    }
    for symbol in rhs.iter() {
      if strip_optional(symbol).is_empty() {
        return Err(Error::InvalidSymbol {
          symbol: symbol.clone(),
          expected: "a terminal or non-terminal",
        });
      }
    }
    if rhs.iter().all(|s| is_optional(s)) {
      return Err(Error::InvalidRule {
        tag: tag.to_string(),
        reason: "rhs cannot be all optional symbols".to_string(),
      });
    }
    Ok(Self {
      tag: tag.to_string(),
      lhs: lhs.to_string(),
      rhs,
      semantics,
    })
  }

  pub fn arity(&self) -> usize {
    self.rhs.len()
  }

  pub fn is_unary(&self) -> bool {
    self.arity() == 1
  }

  pub fn is_binary(&self) -> bool {
    self.arity() == 2
  }

  pub fn is_nary(&self) -> bool {
    self.arity() > 2
  }

  /// All rhs symbols are terminals.
  pub fn is_lexical(&self) -> bool {
    self.rhs.iter().all(|s| is_terminal(s))
  }

  /// All rhs symbols are non-terminals.
  pub fn is_categorical(&self) -> bool {
    self.rhs.iter().all(|s| is_nonterminal(s))
  }

  pub fn is_mixed(&self) -> bool {
    !self.is_lexical() && !self.is_categorical()
  }

  pub fn has_optionals(&self) -> bool {
    self.rhs.iter().any(|s| is_optional(s))
  }

  /// Index of the first optional rhs symbol, if any.
  pub fn first_optional(&self) -> Option<usize> {
    self.rhs.iter().position(|s| is_optional(s))
  }

  /// Evaluates this rule's semantics over child denotations.
  pub fn apply(&self, args: &[Value]) -> Result<Value, Error> {
    (self.semantics)(args)
  }
}

impl fmt::Debug for Rule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Rule")
      .field("tag", &self.tag)
      .field("lhs", &self.lhs)
      .field("rhs", &self.rhs)
      .finish()
  }
}

impl fmt::Display for Rule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ->", self.lhs)?;
    for s in self.rhs.iter() {
      write!(f, " {}", s)?;
    }
    write!(f, " [{}]", self.tag)
  }
}
