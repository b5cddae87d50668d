use std::rc::Rc;

use crate::chart::Chart;
use crate::derivation::Derivation;
use crate::error::Error;
use crate::grammar::Grammar;
use crate::rule::Rule;
use crate::tokenizer::{BasicTokenizer, Tokenizer};

/// A pluggable recognizer consulted on every chart span. Derivations it
/// returns are added to the cell unchanged; their categories are carried
/// as-is and need not exist in the host grammar.
pub trait SubParser {
  fn parse_span(&self, span: &str) -> Vec<Rc<Derivation>>;
}

/// Bottom-up chart parser over a normalized grammar.
///
/// Configured once, read-only afterwards: a `Parser` can serve any number of
/// `parse` calls.
pub struct Parser {
  pub grammar: Grammar,
  tokenizer: Rc<dyn Tokenizer>,
  sub_parsers: Vec<Rc<dyn SubParser>>,
}

impl Parser {
  /// A parser over the default tokenizer with no sub-parsers.
  pub fn new(rules: Vec<Rule>, roots: &[&str]) -> Result<Self, Error> {
    Self::with_parts(rules, roots, Rc::new(BasicTokenizer), Vec::new())
  }

  /// Grammar normalization and parsing share the one tokenizer, so lexical
  /// table keys always agree with chart lookup keys.
  pub fn with_parts(
    rules: Vec<Rule>,
    roots: &[&str],
    tokenizer: Rc<dyn Tokenizer>,
    sub_parsers: Vec<Rc<dyn SubParser>>,
  ) -> Result<Self, Error> {
    let grammar = Grammar::new(rules, roots, tokenizer.as_ref())?;
    Ok(Self {
      grammar,
      tokenizer,
      sub_parsers,
    })
  }

  /// Fills the whole chart for `s`.
  ///
  /// Cells are filled in order of increasing span length; within a cell the
  /// insertion order is: sub-parser derivations, lexical rules, binary
  /// rules in split order, then the unary closure. The closure walks the
  /// cell while it grows; it terminates because normalization rejects
  /// cyclic unary chains.
  pub fn parse_chart(&self, s: &str) -> Result<Chart, Error> {
    let tokens = self.tokenizer.tokenize(s)?;
    let t = tokens.len();
    let mut chart = Chart::new(t);

    for l in 1..=t {
      for i in 0..=(t - l) {
        let j = i + l;
        let span = &s[tokens[i].span.0..tokens[j - 1].span.1];
        let mut cell: Vec<Rc<Derivation>> = Vec::new();

        for sub in self.sub_parsers.iter() {
          cell.extend(sub.parse_span(span));
        }

        let key: Vec<String> = tokens[i..j].iter().map(|tok| tok.text.clone()).collect();
        if let Some(rules) = self.grammar.lexical.get(&key) {
          for rule in rules.iter() {
            cell.push(Rc::new(Derivation::from_rule(rule, span.to_string(), Vec::new())));
          }
        }

        for k in (i + 1)..j {
          for left in chart.cell(i, k).iter() {
            for right in chart.cell(k, j).iter() {
              let pair = (left.category.clone(), right.category.clone());
              if let Some(rules) = self.grammar.binary.get(&pair) {
                for rule in rules.iter() {
                  cell.push(Rc::new(Derivation::from_rule(
                    rule,
                    span.to_string(),
                    vec![left.clone(), right.clone()],
                  )));
                }
              }
            }
          }
        }

        let mut idx = 0;
        while idx < cell.len() {
          let child = cell[idx].clone();
          idx += 1;
          if let Some(rules) = self.grammar.unary.get(&child.category) {
            for rule in rules.iter() {
              cell.push(Rc::new(Derivation::from_rule(
                rule,
                span.to_string(),
                vec![child.clone()],
              )));
            }
          }
        }

        chart.set(i, j, cell);
      }
    }

    Ok(chart)
  }

  /// Parses `s`, keeping only derivations whose category is in the
  /// grammar's root set.
  pub fn parse(&self, s: &str) -> Result<Vec<Rc<Derivation>>, Error> {
    let roots: Vec<&str> = self.grammar.roots.iter().map(String::as_str).collect();
    self.parse_with_roots(s, &roots)
  }

  /// Parses `s` against an explicit root set; an empty set accepts every
  /// category.
  pub fn parse_with_roots(&self, s: &str, roots: &[&str]) -> Result<Vec<Rc<Derivation>>, Error> {
    let chart = self.parse_chart(s)?;
    let t = chart.tokens();
    if t == 0 {
      return Ok(Vec::new());
    }
    Ok(
      chart
        .cell(0, t)
        .iter()
        .filter(|d| roots.is_empty() || roots.contains(&d.category.as_str()))
        .cloned()
        .collect(),
    )
  }
}
