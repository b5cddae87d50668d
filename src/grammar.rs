use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::error::Error;
use crate::rule::{Rule, Semantics};
use crate::symbol::{is_nonterminal, strip_optional, BINARIZATION_SEP, LIFTED_PREFIX};
use crate::tokenizer::Tokenizer;
use crate::value::Value;

/// A grammar normalized for bottom-up chart parsing.
///
/// Every installed rule is strictly lexical, unary, or binary. Author rules
/// that don't fit are rewritten on the way in: optionals are expanded into
/// included/omitted variants, terminals inside categorical rules are lifted
/// to synthetic `$@` categories, and longer categorical rules are binarized
/// left-to-right through synthetic `A_B` categories.
pub struct Grammar {
  /// Lexical rules keyed by the tokenizer-canonical form of their rhs.
  pub lexical: HashMap<Vec<String>, Vec<Rc<Rule>>>,
  /// Unary categorical rules keyed by their single rhs category.
  pub unary: HashMap<String, Vec<Rc<Rule>>>,
  /// Binary categorical rules keyed by their rhs category pair.
  pub binary: HashMap<(String, String), Vec<Rc<Rule>>>,
  /// Categories accepted at the top of a parse; empty accepts everything.
  pub roots: Vec<String>,
}

impl Grammar {
  pub fn new(rules: Vec<Rule>, roots: &[&str], tokenizer: &dyn Tokenizer) -> Result<Self, Error> {
    let mut grammar = Self {
      lexical: HashMap::new(),
      unary: HashMap::new(),
      binary: HashMap::new(),
      roots: roots.iter().map(|r| r.to_string()).collect(),
    };

    let mut queue: VecDeque<Rule> = rules.into_iter().collect();
    let mut lifted_keys: HashSet<String> = HashSet::new();
    let mut binarized_categories: HashSet<String> = HashSet::new();

    while let Some(rule) = queue.pop_front() {
      if let Some(pos) = rule.first_optional() {
        debug!("expanding optional in {}", rule);
        let (included, omitted) = expand_optional(rule, pos)?;
        queue.push_back(included);
        queue.push_back(omitted);
      } else if rule.is_mixed() {
        debug!("lifting terminals in {}", rule);
        for r in lift_terminals(rule, tokenizer, &mut lifted_keys)? {
          queue.push_back(r);
        }
      } else if rule.is_nary() && rule.is_categorical() {
        debug!("binarizing {}", rule);
        for r in binarize(rule, &mut binarized_categories)? {
          queue.push_back(r);
        }
      } else {
        grammar.install(rule, tokenizer)?;
      }
    }

    grammar.check_unary_cycles()?;
    Ok(grammar)
  }

  /// Number of installed rules across all three tables.
  pub fn len(&self) -> usize {
    self.lexical.values().map(Vec::len).sum::<usize>()
      + self.unary.values().map(Vec::len).sum::<usize>()
      + self.binary.values().map(Vec::len).sum::<usize>()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  fn install(&mut self, rule: Rule, tokenizer: &dyn Tokenizer) -> Result<(), Error> {
    if rule.is_lexical() {
      let mut key = Vec::new();
      for symbol in rule.rhs.iter() {
        let tokens = tokenizer.tokenize(symbol)?;
        if tokens.is_empty() {
          return Err(Error::InvalidGrammar {
            tag: rule.tag.clone(),
            reason: format!("terminal `{}` tokenizes to nothing", symbol),
          });
        }
        key.extend(tokens.into_iter().map(|t| t.text));
      }
      self.lexical.entry(key).or_insert_with(Vec::new).push(Rc::new(rule));
    } else if rule.is_unary() && rule.is_categorical() {
      self
        .unary
        .entry(rule.rhs[0].clone())
        .or_insert_with(Vec::new)
        .push(Rc::new(rule));
    } else if rule.is_binary() && rule.is_categorical() {
      self
        .binary
        .entry((rule.rhs[0].clone(), rule.rhs[1].clone()))
        .or_insert_with(Vec::new)
        .push(Rc::new(rule));
    } else {
      return Err(Error::InvalidGrammar {
        tag: rule.tag.clone(),
        reason: format!("unrecognized shape after expansion: {}", rule),
      });
    }
    Ok(())
  }

  /// The parser closes cells under unary rules by walking them to a fixed
  /// point, so a cyclic unary chain would never terminate. Reject it here.
  fn check_unary_cycles(&self) -> Result<(), Error> {
    const WHITE: u8 = 0;
    const GREY: u8 = 1;
    const BLACK: u8 = 2;

    fn visit<'a>(
      category: &'a str,
      unary: &'a HashMap<String, Vec<Rc<Rule>>>,
      marks: &mut HashMap<&'a str, u8>,
    ) -> Result<(), Error> {
      marks.insert(category, GREY);
      if let Some(rules) = unary.get(category) {
        for rule in rules.iter() {
          match marks.get(rule.lhs.as_str()).copied().unwrap_or(WHITE) {
            GREY => {
              return Err(Error::InvalidGrammar {
                tag: rule.tag.clone(),
                reason: format!("unary cycle through `{}`", rule.lhs),
              })
            }
            WHITE => visit(&rule.lhs, unary, marks)?,
            _ => {}
          }
        }
      }
      marks.insert(category, BLACK);
      Ok(())
    }

    let mut marks: HashMap<&str, u8> = HashMap::new();
    for category in self.unary.keys() {
      if marks.get(category.as_str()).copied().unwrap_or(WHITE) == WHITE {
        visit(category, &self.unary, &mut marks)?;
      }
    }
    Ok(())
  }
}

impl fmt::Display for Grammar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "//** roots:")?;
    for root in self.roots.iter() {
      write!(f, " {}", root)?;
    }
    writeln!(f)?;

    for rule in self.lexical.values().flatten() {
      writeln!(f, "{}", rule)?;
    }
    for rule in self.unary.values().flatten() {
      writeln!(f, "{}", rule)?;
    }
    for rule in self.binary.values().flatten() {
      writeln!(f, "{}", rule)?;
    }
    Ok(())
  }
}

/// Splits a rule at its first optional symbol into an included variant
/// (marker stripped, semantics untouched) and an omitted variant (symbol
/// dropped, semantics re-inserting null at the omitted position).
fn expand_optional(rule: Rule, pos: usize) -> Result<(Rule, Rule), Error> {
  let base = strip_optional(&rule.rhs[pos]).to_string();

  let mut included_rhs = rule.rhs.clone();
  included_rhs[pos] = base.clone();
  let included = Rule::with_rhs(
    &format!("{}_{}", rule.tag, base),
    &rule.lhs,
    included_rhs,
    rule.semantics.clone(),
  )?;

  let mut omitted_rhs = rule.rhs.clone();
  omitted_rhs.remove(pos);
  let original = rule.semantics.clone();
  let omitted_sem: Semantics = Rc::new(move |args: &[Value]| {
    if pos > args.len() {
      return Err(Error::Evaluation(format!(
        "cannot re-insert omitted child at {} with {} children",
        pos,
        args.len()
      )));
    }
    let mut full = Vec::with_capacity(args.len() + 1);
    full.extend_from_slice(&args[..pos]);
    full.push(Value::Null);
    full.extend_from_slice(&args[pos..]);
    (original)(&full)
  });
  let omitted = Rule::with_rhs(
    &format!("{}_~{}", rule.tag, base),
    &rule.lhs,
    omitted_rhs,
    omitted_sem,
  )?;

  Ok((included, omitted))
}

/// Rewrites a mixed rule so its rhs is fully categorical, lifting each
/// terminal `w` to a synthetic `$@` category. One lexical rule `$@key -> w`
/// is emitted per unique key; its denotation is the literal terminal string.
fn lift_terminals(
  rule: Rule,
  tokenizer: &dyn Tokenizer,
  lifted_keys: &mut HashSet<String>,
) -> Result<Vec<Rule>, Error> {
  let mut out = Vec::new();
  let mut new_rhs = Vec::with_capacity(rule.rhs.len());

  for symbol in rule.rhs.iter() {
    if is_nonterminal(symbol) {
      new_rhs.push(symbol.clone());
      continue;
    }
    let tokens = tokenizer.tokenize(symbol)?;
    if tokens.is_empty() {
      return Err(Error::InvalidGrammar {
        tag: rule.tag.clone(),
        reason: format!("terminal `{}` tokenizes to nothing", symbol),
      });
    }
    let key = tokens
      .iter()
      .map(|t| t.text.as_str())
      .collect::<Vec<_>>()
      .join("-");
    let category = format!("{}{}", LIFTED_PREFIX, key);
    if lifted_keys.insert(key) {
      let spelling = symbol.clone();
      out.push(Rule::with_rhs(
        &category[1..],
        &category,
        vec![symbol.clone()],
        Rc::new(move |_: &[Value]| Ok(Value::Str(spelling.clone()))),
      )?);
    }
    new_rhs.push(category);
  }

  out.push(Rule::with_rhs(
    &rule.tag,
    &rule.lhs,
    new_rhs,
    rule.semantics.clone(),
  )?);
  Ok(out)
}

/// Peels the first two categories `A B` off an n-ary categorical rule into a
/// synthetic `A_B` category whose denotation is the pair of its children;
/// the residual rule destructures that pair before delegating to the
/// original semantics. Intermediate categories are deduplicated by name.
fn binarize(rule: Rule, binarized: &mut HashSet<String>) -> Result<Vec<Rule>, Error> {
  let mut out = Vec::new();
  let first = rule.rhs[0].clone();
  let second = rule.rhs[1].clone();
  let category = format!("{}{}{}", first, BINARIZATION_SEP, second);

  if binarized.insert(category.clone()) {
    out.push(Rule::with_rhs(
      &category,
      &category,
      vec![first, second],
      Rc::new(|args: &[Value]| match args {
        [a, b] => Ok(Value::pair(a.clone(), b.clone())),
        _ => Err(Error::Evaluation(format!(
          "pair semantics wants 2 children, got {}",
          args.len()
        ))),
      }),
    )?);
  }

  let original = rule.semantics.clone();
  let residual_sem: Semantics = Rc::new(move |args: &[Value]| match args.split_first() {
    Some((Value::Pair(a, b), rest)) => {
      let mut full = Vec::with_capacity(rest.len() + 2);
      full.push((**a).clone());
      full.push((**b).clone());
      full.extend_from_slice(rest);
      (original)(&full)
    }
    _ => Err(Error::Evaluation(
      "expected a pair denotation from a binarized child".to_string(),
    )),
  });

  let mut residual_rhs = Vec::with_capacity(rule.rhs.len() - 1);
  residual_rhs.push(category);
  residual_rhs.extend_from_slice(&rule.rhs[2..]);
  out.push(Rule::with_rhs(&rule.tag, &rule.lhs, residual_rhs, residual_sem)?);

  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::rule::{constant, project, sem};
  use crate::tokenizer::BasicTokenizer;

  fn grammar(rules: Vec<Rule>) -> Result<Grammar, Error> {
    Grammar::new(rules, &["$ROOT"], &BasicTokenizer)
  }

  fn key(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
  }

  #[test]
  fn installs_plain_shapes() {
    let g = grammar(vec![
      Rule::new("lex", "$A", "hello there", constant(Value::Null)).unwrap(),
      Rule::new("un", "$B", "$A", project(0)).unwrap(),
      Rule::new("bin", "$ROOT", "$A $B", project(0)).unwrap(),
    ])
    .unwrap();

    assert_eq!(g.lexical[&key(&["hello", "there"])].len(), 1);
    assert_eq!(g.unary["$A"].len(), 1);
    assert_eq!(g.binary[&("$A".to_string(), "$B".to_string())].len(), 1);
    assert_eq!(g.len(), 3);
  }

  #[test]
  fn expands_optionals() {
    let g = grammar(vec![Rule::new("root", "$ROOT", "?$A $B", project(1)).unwrap()]).unwrap();

    let omitted = &g.unary["$B"];
    assert_eq!(omitted.len(), 1);
    assert_eq!(omitted[0].tag, "root_~$A");
    let included = &g.binary[&("$A".to_string(), "$B".to_string())];
    assert_eq!(included[0].tag, "root_$A");

    // the omitted variant re-inserts null before delegating
    assert_eq!(omitted[0].apply(&[Value::Int(5)]).unwrap(), Value::Int(5));
    assert_eq!(
      included[0].apply(&[Value::Null, Value::Int(5)]).unwrap(),
      Value::Int(5)
    );
  }

  #[test]
  fn expands_optional_terminals() {
    let g = grammar(vec![
      Rule::new("greet", "$ROOT", "?please $Verb", project(1)).unwrap(),
      Rule::new("verb", "$Verb", "go", constant(Value::Str("go".to_string()))).unwrap(),
    ])
    .unwrap();

    // the included variant is mixed, so `please` gets lifted
    assert_eq!(g.lexical[&key(&["please"])][0].lhs, "$@please");
    assert_eq!(g.unary["$Verb"][0].tag, "greet_~please");
  }

  #[test]
  fn lifts_mixed_rules_once_per_terminal() {
    let g = grammar(vec![
      Rule::new("pow", "$ROOT", "$E to the $E", project(0)).unwrap(),
      Rule::new("upto", "$ROOT", "$E up to $E", project(0)).unwrap(),
    ])
    .unwrap();

    assert_eq!(g.lexical[&key(&["to"])].len(), 1);
    assert_eq!(g.lexical[&key(&["the"])].len(), 1);
    assert_eq!(g.lexical[&key(&["up"])].len(), 1);

    let lifted = &g.lexical[&key(&["to"])][0];
    assert_eq!(lifted.lhs, "$@to");
    assert_eq!(lifted.tag, "@to");
    assert_eq!(lifted.apply(&[]).unwrap(), Value::Str("to".to_string()));
  }

  #[test]
  fn binarizes_nary_rules() {
    let sum = sem(|args: &[Value]| {
      let mut total = 0;
      for a in args.iter() {
        total += a
          .int()
          .ok_or_else(|| Error::Evaluation(format!("expected an int, got {}", a)))?;
      }
      Ok(Value::Int(total))
    });
    let g = grammar(vec![Rule::new("sum", "$ROOT", "$A $B $C", sum).unwrap()]).unwrap();

    let pair_rule = &g.binary[&("$A".to_string(), "$B".to_string())][0];
    assert_eq!(pair_rule.lhs, "$A_$B");
    assert_eq!(pair_rule.tag, "$A_$B");
    let residual = &g.binary[&("$A_$B".to_string(), "$C".to_string())][0];
    assert_eq!(residual.lhs, "$ROOT");
    assert_eq!(residual.tag, "sum");

    // semantics thread through the intermediate pair
    let pair = pair_rule.apply(&[Value::Int(1), Value::Int(2)]).unwrap();
    assert_eq!(residual.apply(&[pair, Value::Int(3)]).unwrap(), Value::Int(6));
  }

  #[test]
  fn deduplicates_binarization_intermediates() {
    let g = grammar(vec![
      Rule::new("x", "$X", "$A $B $C", project(0)).unwrap(),
      Rule::new("y", "$Y", "$A $B $D", project(0)).unwrap(),
    ])
    .unwrap();
    assert_eq!(g.binary[&("$A".to_string(), "$B".to_string())].len(), 1);
  }

  #[test]
  fn rejects_unary_cycles() {
    let two_cycle = grammar(vec![
      Rule::new("ab", "$A", "$B", project(0)).unwrap(),
      Rule::new("ba", "$B", "$A", project(0)).unwrap(),
    ]);
    assert!(matches!(two_cycle, Err(Error::InvalidGrammar { .. })));

    let self_loop = grammar(vec![Rule::new("aa", "$A", "$A", project(0)).unwrap()]);
    assert!(matches!(self_loop, Err(Error::InvalidGrammar { .. })));

    let chain = grammar(vec![
      Rule::new("ab", "$A", "$B", project(0)).unwrap(),
      Rule::new("bc", "$B", "$C", project(0)).unwrap(),
    ]);
    assert!(chain.is_ok());
  }

  #[test]
  fn rejects_unlexable_terminals() {
    let result = grammar(vec![Rule::new("p", "$P", "!!!", constant(Value::Null)).unwrap()]);
    assert!(matches!(result, Err(Error::InvalidGrammar { .. })));
  }
}
