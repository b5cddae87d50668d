//! An arithmetic domain: maps utterances like `what is 2 to the 3` onto
//! integers. Covers number words, digit strings (through a sub-parser),
//! negation, infix operators, and exponentiation spelled `X to the Y`.

use std::rc::Rc;

use regex::Regex;

use crate::derivation::Derivation;
use crate::error::Error;
use crate::parser::{Parser, SubParser};
use crate::rule::{constant, project, sem, Rule};
use crate::tokenizer::BasicTokenizer;
use crate::value::Value;

const NUMBER_WORDS: [(&str, i64); 10] = [
  ("one", 1),
  ("two", 2),
  ("three", 3),
  ("four", 4),
  ("five", 5),
  ("six", 6),
  ("seven", 7),
  ("eight", 8),
  ("nine", 9),
  ("ten", 10),
];

/// Recognizes digit spans like `43` and offers them as `$Number`.
pub struct NumberParser;

impl SubParser for NumberParser {
  fn parse_span(&self, span: &str) -> Vec<Rc<Derivation>> {
    lazy_static! {
      static ref DIGITS: Regex = Regex::new(r"^[0-9]+$").unwrap();
    }
    if !DIGITS.is_match(span) {
      return Vec::new();
    }
    match span.parse::<i64>() {
      Ok(n) => vec![Rc::new(Derivation::new(
        "number",
        "$Number",
        span.to_string(),
        Vec::new(),
        constant(Value::Int(n)),
      ))],
      Err(_) => Vec::new(),
    }
  }
}

fn binary_op(args: &[Value]) -> Result<Value, Error> {
  match args {
    [Value::Int(a), Value::Str(op), Value::Int(b)] => {
      let result = match op.as_str() {
        "+" => a.checked_add(*b),
        "-" => a.checked_sub(*b),
        "*" => a.checked_mul(*b),
        _ => None,
      };
      result
        .map(Value::Int)
        .ok_or_else(|| Error::Evaluation(format!("cannot evaluate {} {} {}", a, op, b)))
    }
    _ => Err(Error::Evaluation(format!(
      "binary operator over unexpected arguments: {:?}",
      args
    ))),
  }
}

fn unary_op(args: &[Value]) -> Result<Value, Error> {
  match args {
    [Value::Str(op), Value::Int(a)] if op.as_str() == "-" => a
      .checked_neg()
      .map(Value::Int)
      .ok_or_else(|| Error::Evaluation(format!("cannot negate {}", a))),
    _ => Err(Error::Evaluation(format!(
      "unary operator over unexpected arguments: {:?}",
      args
    ))),
  }
}

fn power(args: &[Value]) -> Result<Value, Error> {
  match args {
    [Value::Int(base), Value::Str(_), Value::Str(_), Value::Int(exp)] => {
      if *exp < 0 || *exp > u32::MAX as i64 {
        return Err(Error::Evaluation(format!("exponent {} out of range", exp)));
      }
      base
        .checked_pow(*exp as u32)
        .map(Value::Int)
        .ok_or_else(|| Error::Evaluation(format!("{} to the {} overflows", base, exp)))
    }
    _ => Err(Error::Evaluation(format!(
      "power over unexpected arguments: {:?}",
      args
    ))),
  }
}

pub fn rules() -> Result<Vec<Rule>, Error> {
  let mut rules = vec![
    Rule::new("root", "$ROOT", "?$Preamble $Expr", project(1))?,
    Rule::new("preamble_what_is", "$Preamble", "what is", constant(Value::Null))?,
    Rule::new("preamble_how_about", "$Preamble", "how about", constant(Value::Null))?,
    Rule::new("expr_number", "$Expr", "$Number", project(0))?,
    Rule::new("expr_binary", "$Expr", "$Expr $BinOp $Expr", sem(binary_op))?,
    Rule::new("expr_unary", "$Expr", "$UnOp $Expr", sem(unary_op))?,
    Rule::new("expr_power", "$Expr", "$Expr to the $Expr", sem(power))?,
    Rule::new("op_plus", "$BinOp", "plus", constant(Value::Str("+".to_string())))?,
    Rule::new("op_minus", "$BinOp", "minus", constant(Value::Str("-".to_string())))?,
    Rule::new("op_times", "$BinOp", "times", constant(Value::Str("*".to_string())))?,
    Rule::new("op_negate", "$UnOp", "minus", constant(Value::Str("-".to_string())))?,
  ];
  for (word, n) in NUMBER_WORDS.iter() {
    rules.push(Rule::new(
      &format!("number_{}", word),
      "$Number",
      word,
      constant(Value::Int(*n)),
    )?);
  }
  Ok(rules)
}

/// The assembled domain: grammar, default tokenizer, digit sub-parser.
pub fn parser() -> Result<Parser, Error> {
  Parser::with_parts(
    rules()?,
    &["$ROOT"],
    Rc::new(BasicTokenizer),
    vec![Rc::new(NumberParser)],
  )
}
