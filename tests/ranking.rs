use std::rc::Rc;

use denote::eval::{denotation_accuracy, oracle_accuracy};
use denote::features::ParseCounts;
use denote::ranker::{ConstantRanker, LinearRanker, Ranker, SoftmaxRanker};
use denote::rule::{constant, project, Rule};
use denote::{Error, Parser, Value};

/// `foo` parses two ways, denoting 1 (tag `low`) or 2 (tag `high`).
fn ambiguous_parser() -> Rc<Parser> {
  let rules = vec![
    Rule::new("root", "$ROOT", "$A", project(0)).unwrap(),
    Rule::new("low", "$A", "foo", constant(Value::Int(1))).unwrap(),
    Rule::new("high", "$A", "foo", constant(Value::Int(2))).unwrap(),
  ];
  Rc::new(Parser::new(rules, &["$ROOT"]).unwrap())
}

#[test]
fn constant_ranker_preserves_parser_order_and_aggregates() {
  let ranker = ConstantRanker {
    parser: ambiguous_parser(),
  };

  let parses = ranker.scores_and_parses("foo").unwrap();
  assert_eq!(parses.len(), 2);
  assert!(parses.iter().all(|(score, _)| *score == 0.0));
  assert_eq!(parses[0].1.denotation().unwrap(), Value::Int(1));
  assert_eq!(parses[1].1.denotation().unwrap(), Value::Int(2));

  let denotations = ranker.scores_and_denotations("foo").unwrap();
  assert_eq!(denotations.len(), 2);
  assert_eq!(denotations[0], (0.0, Value::Int(1)));
  assert_eq!(denotations[1], (0.0, Value::Int(2)));
}

#[test]
fn fit_rejects_mismatched_lengths() {
  let mut constant_ranker = ConstantRanker {
    parser: ambiguous_parser(),
  };
  assert!(matches!(
    constant_ranker.fit(&["foo"], &[]),
    Err(Error::LengthMismatch { .. })
  ));

  let mut linear = LinearRanker::new(ambiguous_parser(), Box::new(ParseCounts));
  assert!(matches!(
    linear.fit(&["foo", "foo"], &[Value::Int(1)]),
    Err(Error::LengthMismatch { .. })
  ));

  let mut softmax = SoftmaxRanker::new(ambiguous_parser(), Box::new(ParseCounts));
  assert!(matches!(
    softmax.fit(&[], &[Value::Int(1)]),
    Err(Error::LengthMismatch { .. })
  ));
}

#[test]
fn unfitted_rankers_score_zero_without_failing() {
  let linear = LinearRanker::new(ambiguous_parser(), Box::new(ParseCounts));
  let parses = linear.scores_and_parses("foo").unwrap();
  assert_eq!(parses.len(), 2);
  assert!(parses.iter().all(|(score, _)| *score == 0.0));

  let softmax = SoftmaxRanker::new(ambiguous_parser(), Box::new(ParseCounts));
  let denotations = softmax.scores_and_denotations("foo").unwrap();
  assert_eq!(denotations.len(), 2);
  // uniform probabilities over two parses
  assert!((denotations[0].0 - 0.5).abs() < 1e-12);
}

#[test]
fn linear_ranker_learns_the_labeled_denotation() {
  let mut ranker = LinearRanker::new(ambiguous_parser(), Box::new(ParseCounts));
  let utterances = ["foo", "foo", "foo"];
  let labels = vec![Value::Int(2); 3];

  ranker.fit(&utterances, &labels).unwrap();

  assert_eq!(ranker.top_denotation("foo").unwrap(), Some(Value::Int(2)));
  let high = ranker.weights.get("high").copied().unwrap_or(0.0);
  let low = ranker.weights.get("low").copied().unwrap_or(0.0);
  assert!(high > low);

  let scored = ranker.scores_and_denotations("foo").unwrap();
  assert_eq!(scored[0].1, Value::Int(2));
  assert!(scored[0].0 > scored[1].0);
}

#[test]
fn softmax_ranker_learns_the_labeled_denotation() {
  let mut ranker = SoftmaxRanker::new(ambiguous_parser(), Box::new(ParseCounts));
  let utterances = ["foo", "foo"];
  let labels = vec![Value::Int(1); 2];

  ranker.fit(&utterances, &labels).unwrap();

  assert_eq!(ranker.top_denotation("foo").unwrap(), Some(Value::Int(1)));
  let scored = ranker.scores_and_denotations("foo").unwrap();
  assert!(scored[0].0 > 0.5);
  let total: f64 = scored.iter().map(|(p, _)| p).sum();
  assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn fit_skips_samples_with_no_correct_parse() {
  let mut ranker = LinearRanker::new(ambiguous_parser(), Box::new(ParseCounts));
  // the label 7 is never produced; training data also mixes in real labels
  let utterances = ["foo", "foo", "foo"];
  let labels = vec![Value::Int(7), Value::Int(2), Value::Int(2)];

  ranker.fit(&utterances, &labels).unwrap();
  assert_eq!(ranker.top_denotation("foo").unwrap(), Some(Value::Int(2)));
}

#[test]
fn training_reaches_the_oracle_ceiling() {
  let mut ranker = LinearRanker::new(ambiguous_parser(), Box::new(ParseCounts));
  let utterances = ["foo", "foo", "foo"];
  let labels = vec![Value::Int(2); 3];

  // before training the wrong denotation ranks first
  assert_eq!(denotation_accuracy(&ranker, &utterances, &labels).unwrap(), 0.0);
  assert_eq!(oracle_accuracy(&ranker, &utterances, &labels).unwrap(), 1.0);

  ranker.fit(&utterances, &labels).unwrap();
  assert_eq!(denotation_accuracy(&ranker, &utterances, &labels).unwrap(), 1.0);
}

#[test]
fn refitting_converged_weights_barely_moves_them() {
  let mut ranker = LinearRanker::new(ambiguous_parser(), Box::new(ParseCounts));
  let utterances = ["foo", "foo", "foo"];
  let labels = vec![Value::Int(2); 3];

  ranker.fit(&utterances, &labels).unwrap();
  let before = ranker.weights.clone();

  ranker.fit(&utterances, &labels).unwrap();
  for (name, weight) in ranker.weights.iter() {
    let previous = before.get(name).copied().unwrap_or(0.0);
    assert!(
      (weight - previous).abs() < 0.05,
      "weight {} drifted from {} to {}",
      name,
      previous,
      weight
    );
  }
  assert_eq!(ranker.top_denotation("foo").unwrap(), Some(Value::Int(2)));
}

#[test]
fn fit_tolerates_unparseable_utterances() {
  let mut ranker = SoftmaxRanker::new(ambiguous_parser(), Box::new(ParseCounts));
  let utterances = ["qux", "foo"];
  let labels = vec![Value::Int(1), Value::Int(1)];

  ranker.fit(&utterances, &labels).unwrap();
  assert_eq!(ranker.top_denotation("foo").unwrap(), Some(Value::Int(1)));
}
