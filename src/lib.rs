#[macro_use]
extern crate lazy_static;

pub mod chart;
pub mod derivation;
pub mod domains;
pub mod error;
pub mod eval;
pub mod features;
pub mod grammar;
pub mod parser;
pub mod ranker;
pub mod rule;
pub mod symbol;
pub mod tokenizer;
pub mod value;

pub use crate::derivation::Derivation;
pub use crate::error::Error;
pub use crate::grammar::Grammar;
pub use crate::parser::{Parser, SubParser};
pub use crate::ranker::{ConstantRanker, LinearRanker, Ranker, SoftmaxRanker};
pub use crate::rule::Rule;
pub use crate::tokenizer::{BasicTokenizer, Token, Tokenizer};
pub use crate::value::Value;

#[test]
fn test_end_to_end_arithmetic() {
  use std::rc::Rc;

  let parser = Rc::new(domains::arithmetic::parser().unwrap());
  let ranker = ConstantRanker { parser };

  let top = |s: &str| ranker.top_denotation(s).unwrap().unwrap();
  assert_eq!(top("two plus two"), Value::Int(4));
  assert_eq!(top("minus three times 3"), Value::Int(-9));
  assert!(ranker.top_denotation("giraffe").unwrap().is_none());
}
