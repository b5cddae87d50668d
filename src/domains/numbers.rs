//! A number-word domain: compositional cardinals (`forty two`, `three
//! hundred`) and ordinals (`third`). Parses against two root categories,
//! `$Number` and `$Ordinal`.

use crate::error::Error;
use crate::parser::Parser;
use crate::rule::{constant, project, sem, Rule};
use crate::value::Value;

const UNITS: [(&str, i64); 9] = [
  ("one", 1),
  ("two", 2),
  ("three", 3),
  ("four", 4),
  ("five", 5),
  ("six", 6),
  ("seven", 7),
  ("eight", 8),
  ("nine", 9),
];

const TEENS: [(&str, i64); 10] = [
  ("ten", 10),
  ("eleven", 11),
  ("twelve", 12),
  ("thirteen", 13),
  ("fourteen", 14),
  ("fifteen", 15),
  ("sixteen", 16),
  ("seventeen", 17),
  ("eighteen", 18),
  ("nineteen", 19),
];

const TENS: [(&str, i64); 8] = [
  ("twenty", 20),
  ("thirty", 30),
  ("forty", 40),
  ("fifty", 50),
  ("sixty", 60),
  ("seventy", 70),
  ("eighty", 80),
  ("ninety", 90),
];

const ORDINALS: [(&str, i64); 10] = [
  ("first", 1),
  ("second", 2),
  ("third", 3),
  ("fourth", 4),
  ("fifth", 5),
  ("sixth", 6),
  ("seventh", 7),
  ("eighth", 8),
  ("ninth", 9),
  ("tenth", 10),
];

fn compound(args: &[Value]) -> Result<Value, Error> {
  match args {
    [Value::Int(tens), Value::Int(unit)] => Ok(Value::Int(tens + unit)),
    _ => Err(Error::Evaluation(format!(
      "compound number over unexpected arguments: {:?}",
      args
    ))),
  }
}

fn hundreds(args: &[Value]) -> Result<Value, Error> {
  match args {
    [Value::Int(unit), Value::Str(_)] => Ok(Value::Int(unit * 100)),
    _ => Err(Error::Evaluation(format!(
      "hundreds over unexpected arguments: {:?}",
      args
    ))),
  }
}

pub fn rules() -> Result<Vec<Rule>, Error> {
  let mut rules = vec![
    Rule::new("number_unit", "$Number", "$Unit", project(0))?,
    Rule::new("number_teen", "$Number", "$Teen", project(0))?,
    Rule::new("number_tens", "$Number", "$Tens", project(0))?,
    Rule::new("number_compound", "$Number", "$Tens $Unit", sem(compound))?,
    Rule::new("number_hundreds", "$Number", "$Unit hundred", sem(hundreds))?,
  ];
  for (word, n) in UNITS.iter() {
    rules.push(Rule::new(&format!("unit_{}", word), "$Unit", word, constant(Value::Int(*n)))?);
  }
  for (word, n) in TEENS.iter() {
    rules.push(Rule::new(&format!("teen_{}", word), "$Teen", word, constant(Value::Int(*n)))?);
  }
  for (word, n) in TENS.iter() {
    rules.push(Rule::new(&format!("tens_{}", word), "$Tens", word, constant(Value::Int(*n)))?);
  }
  for (word, n) in ORDINALS.iter() {
    rules.push(Rule::new(
      &format!("ordinal_{}", word),
      "$Ordinal",
      word,
      constant(Value::Int(*n)),
    )?);
  }
  Ok(rules)
}

/// The assembled domain over both root categories.
pub fn parser() -> Result<Parser, Error> {
  Parser::new(rules()?, &["$Number", "$Ordinal"])
}
