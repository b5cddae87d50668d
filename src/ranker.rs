use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::derivation::Derivation;
use crate::error::Error;
use crate::features::{FeatureMap, Featurizer};
use crate::parser::Parser;
use crate::value::Value;

/// Fixed shuffle seed: training visits samples in a shuffled order that is
/// reproducible across runs.
const SHUFFLE_SEED: u64 = 0x5eed;

/// Scores competing derivations of an utterance. Scores are comparable
/// within a single call, not across rankers. An unfitted ranker scores with
/// zero weights; it never fails for being unfitted.
pub trait Ranker {
  /// Trains on labeled (utterance, denotation) pairs.
  fn fit(&mut self, utterances: &[&str], denotations: &[Value]) -> Result<(), Error>;

  /// All parses of `s` with their scores, best first.
  fn scores_and_parses(&self, s: &str) -> Result<Vec<(f64, Rc<Derivation>)>, Error>;

  /// Distinct denotations of `s` with their aggregated scores, best first.
  fn scores_and_denotations(&self, s: &str) -> Result<Vec<(f64, Value)>, Error>;

  fn top_parse(&self, s: &str) -> Result<Option<Rc<Derivation>>, Error> {
    Ok(self.scores_and_parses(s)?.into_iter().next().map(|(_, d)| d))
  }

  fn top_denotation(&self, s: &str) -> Result<Option<Value>, Error> {
    Ok(
      self
        .scores_and_denotations(s)?
        .into_iter()
        .next()
        .map(|(_, v)| v),
    )
  }
}

fn dot(weights: &HashMap<String, f64>, features: &FeatureMap) -> f64 {
  features
    .iter()
    .map(|(name, value)| weights.get(name).copied().unwrap_or(0.0) * value)
    .sum()
}

/// Stable descending sort; ties keep their existing order.
fn sort_scored<T>(scored: &mut Vec<(f64, T)>) {
  scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
}

/// Numerically stable softmax: the max logit is subtracted before
/// exponentiation so large weights cannot overflow `exp`.
fn softmax(logits: &[f64]) -> Vec<f64> {
  if logits.is_empty() {
    return Vec::new();
  }
  let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
  let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
  let z: f64 = exps.iter().sum();
  exps.into_iter().map(|e| e / z).collect()
}

fn check_lengths(utterances: usize, denotations: usize) -> Result<(), Error> {
  if utterances != denotations {
    Err(Error::LengthMismatch {
      utterances,
      denotations,
    })
  } else {
    Ok(())
  }
}

/// Lazy L2 regularization bookkeeping: each feature remembers the step at
/// which it was last touched and is decayed by `(1 - eta*lambda)^elapsed`
/// when touched again. `flush` settles every feature, as at epoch end.
struct LazyL2 {
  factor: f64,
  last_update: HashMap<String, usize>,
}

impl LazyL2 {
  fn new(eta: f64, lambda: f64) -> Self {
    Self {
      factor: 1.0 - eta * lambda,
      last_update: HashMap::new(),
    }
  }

  fn catch_up(&mut self, weights: &mut HashMap<String, f64>, feature: &str, step: usize) {
    let last = self.last_update.get(feature).copied().unwrap_or(0);
    if step > last {
      if let Some(w) = weights.get_mut(feature) {
        *w *= self.factor.powi((step - last) as i32);
      }
    }
    self.last_update.insert(feature.to_string(), step);
  }

  fn flush(&mut self, weights: &mut HashMap<String, f64>, step: usize) {
    let names: Vec<String> = weights.keys().cloned().collect();
    for name in names {
      self.catch_up(weights, &name, step);
    }
  }
}

/// Scores every parse 0 and preserves parser order. Useful as a baseline
/// and for grammars whose ambiguity collapses to one denotation anyway.
pub struct ConstantRanker {
  pub parser: Rc<Parser>,
}

impl Ranker for ConstantRanker {
  fn fit(&mut self, utterances: &[&str], denotations: &[Value]) -> Result<(), Error> {
    check_lengths(utterances.len(), denotations.len())
  }

  fn scores_and_parses(&self, s: &str) -> Result<Vec<(f64, Rc<Derivation>)>, Error> {
    Ok(self.parser.parse(s)?.into_iter().map(|d| (0.0, d)).collect())
  }

  fn scores_and_denotations(&self, s: &str) -> Result<Vec<(f64, Value)>, Error> {
    let mut out: Vec<(f64, Value)> = Vec::new();
    for (_, d) in self.scores_and_parses(s)? {
      let denotation = d.denotation()?;
      if !out.iter().any(|(_, seen)| *seen == denotation) {
        out.push((0.0, denotation));
      }
    }
    Ok(out)
  }
}

/// Structured-margin linear ranker. A parse scores the dot product of its
/// featurization with the learned weights; a denotation scores the maximum
/// over its parses.
pub struct LinearRanker {
  pub parser: Rc<Parser>,
  pub featurizer: Box<dyn Featurizer>,
  pub weights: HashMap<String, f64>,
  pub max_epochs: usize,
  pub tol: f64,
  pub eta: f64,
  pub lambda: f64,
  pub margin: f64,
}

impl LinearRanker {
  pub fn new(parser: Rc<Parser>, featurizer: Box<dyn Featurizer>) -> Self {
    Self {
      parser,
      featurizer,
      weights: HashMap::new(),
      max_epochs: 100,
      tol: 1e-2,
      eta: 1e-2,
      lambda: 1e-2,
      margin: 1.0,
    }
  }
}

impl Ranker for LinearRanker {
  /// One epoch visits every sample in a shuffled order. Per sample: the
  /// highest-scoring parse with the labeled denotation is the target; every
  /// incorrect parse within `margin` of it is a violator and pulls the
  /// weights apart. Samples with no correct parse stay in the shuffle but
  /// are skipped when reached. Training stops when the epoch loss changes
  /// by at most `tol`.
  fn fit(&mut self, utterances: &[&str], denotations: &[Value]) -> Result<(), Error> {
    check_lengths(utterances.len(), denotations.len())?;

    let mut rng = SmallRng::seed_from_u64(SHUFFLE_SEED);
    let mut order: Vec<usize> = (0..utterances.len()).collect();
    let mut lazy = LazyL2::new(self.eta, self.lambda);
    let mut prev_loss = f64::INFINITY;
    let mut step = 0;

    for epoch in 0..self.max_epochs {
      order.shuffle(&mut rng);
      let mut loss = 0.0;

      for &i in order.iter() {
        step += 1;
        let parses = self.parser.parse(utterances[i])?;
        if parses.is_empty() {
          continue;
        }

        let mut feats = Vec::with_capacity(parses.len());
        let mut scores = Vec::with_capacity(parses.len());
        let mut correct = Vec::with_capacity(parses.len());
        for d in parses.iter() {
          let f = self.featurizer.featurize(d);
          scores.push(dot(&self.weights, &f));
          correct.push(d.denotation()? == denotations[i]);
          feats.push(f);
        }

        let mut best: Option<usize> = None;
        for p in 0..parses.len() {
          if !correct[p] {
            continue;
          }
          best = match best {
            Some(b) if scores[p] <= scores[b] => Some(b),
            _ => Some(p),
          };
        }
        let best = match best {
          Some(b) => b,
          None => continue,
        };
        let s_star = scores[best];

        for p in 0..parses.len() {
          if correct[p] || s_star - scores[p] >= self.margin {
            continue;
          }
          loss += (scores[p] + self.margin - s_star).max(0.0);

          let mut names: Vec<String> = feats[p].keys().cloned().collect();
          for name in feats[best].keys() {
            if !feats[p].contains_key(name) {
              names.push(name.clone());
            }
          }
          for name in names {
            let delta = self.eta
              * (feats[p].get(&name).copied().unwrap_or(0.0)
                - feats[best].get(&name).copied().unwrap_or(0.0));
            lazy.catch_up(&mut self.weights, &name, step);
            *self.weights.entry(name).or_insert(0.0) -= delta;
          }
        }
      }

      lazy.flush(&mut self.weights, step);
      debug!("linear epoch {}: loss {:.6}", epoch, loss);
      if (loss - prev_loss).abs() <= self.tol {
        break;
      }
      prev_loss = loss;
    }
    Ok(())
  }

  fn scores_and_parses(&self, s: &str) -> Result<Vec<(f64, Rc<Derivation>)>, Error> {
    let mut scored: Vec<(f64, Rc<Derivation>)> = self
      .parser
      .parse(s)?
      .into_iter()
      .map(|d| (dot(&self.weights, &self.featurizer.featurize(&d)), d))
      .collect();
    sort_scored(&mut scored);
    Ok(scored)
  }

  fn scores_and_denotations(&self, s: &str) -> Result<Vec<(f64, Value)>, Error> {
    // parses arrive best-first, so the first parse seen for a denotation
    // carries its maximum score
    let mut out: Vec<(f64, Value)> = Vec::new();
    for (score, d) in self.scores_and_parses(s)? {
      let denotation = d.denotation()?;
      if !out.iter().any(|(_, seen)| *seen == denotation) {
        out.push((score, denotation));
      }
    }
    Ok(out)
  }
}

/// Marginal-likelihood softmax ranker. A parse scores its probability under
/// a softmax over all parses of the utterance; a denotation scores the sum
/// of its parses' probabilities.
pub struct SoftmaxRanker {
  pub parser: Rc<Parser>,
  pub featurizer: Box<dyn Featurizer>,
  pub weights: HashMap<String, f64>,
  pub max_epochs: usize,
  pub tol: f64,
  pub eta: f64,
  pub lambda: f64,
}

impl SoftmaxRanker {
  pub fn new(parser: Rc<Parser>, featurizer: Box<dyn Featurizer>) -> Self {
    Self {
      parser,
      featurizer,
      weights: HashMap::new(),
      max_epochs: 100,
      tol: 1e-4,
      eta: 1e-3,
      lambda: 1e-3,
    }
  }
}

impl Ranker for SoftmaxRanker {
  /// Minimizes the negative log marginal likelihood of the labeled
  /// denotation, with the same lazy L2 scheme as the linear ranker.
  /// Samples whose labeled denotation has zero probability mass are
  /// skipped.
  fn fit(&mut self, utterances: &[&str], denotations: &[Value]) -> Result<(), Error> {
    check_lengths(utterances.len(), denotations.len())?;

    let mut rng = SmallRng::seed_from_u64(SHUFFLE_SEED);
    let mut order: Vec<usize> = (0..utterances.len()).collect();
    let mut lazy = LazyL2::new(self.eta, self.lambda);
    let mut prev_loss = f64::INFINITY;
    let mut step = 0;

    for epoch in 0..self.max_epochs {
      order.shuffle(&mut rng);
      let mut loss = 0.0;

      for &i in order.iter() {
        step += 1;
        let parses = self.parser.parse(utterances[i])?;
        if parses.is_empty() {
          continue;
        }

        let feats: Vec<FeatureMap> = parses.iter().map(|d| self.featurizer.featurize(d)).collect();
        let logits: Vec<f64> = feats.iter().map(|f| dot(&self.weights, f)).collect();
        let probs = softmax(&logits);
        let mut correct = Vec::with_capacity(parses.len());
        for d in parses.iter() {
          correct.push(d.denotation()? == denotations[i]);
        }

        let p_denotation: f64 = probs
          .iter()
          .zip(correct.iter())
          .filter(|(_, &c)| c)
          .map(|(p, _)| p)
          .sum();
        if p_denotation == 0.0 {
          continue;
        }
        loss += -p_denotation.ln();

        let mut mean = FeatureMap::new();
        for (p, f) in probs.iter().zip(feats.iter()) {
          for (name, value) in f.iter() {
            *mean.entry(name.clone()).or_insert(0.0) += p * value;
          }
        }

        // only features appearing in some correct parse get updated
        let mut grad = FeatureMap::new();
        for p in 0..parses.len() {
          if !correct[p] {
            continue;
          }
          for (name, phi) in feats[p].iter() {
            let mu = mean.get(name).copied().unwrap_or(0.0);
            *grad.entry(name.clone()).or_insert(0.0) +=
              -(1.0 / p_denotation) * probs[p] * (phi - mu);
          }
        }

        for (name, g) in grad {
          lazy.catch_up(&mut self.weights, &name, step);
          *self.weights.entry(name).or_insert(0.0) -= self.eta * g;
        }
      }

      lazy.flush(&mut self.weights, step);
      debug!("softmax epoch {}: loss {:.6}", epoch, loss);
      if (loss - prev_loss).abs() <= self.tol {
        break;
      }
      prev_loss = loss;
    }
    Ok(())
  }

  fn scores_and_parses(&self, s: &str) -> Result<Vec<(f64, Rc<Derivation>)>, Error> {
    let parses = self.parser.parse(s)?;
    let logits: Vec<f64> = parses
      .iter()
      .map(|d| dot(&self.weights, &self.featurizer.featurize(d)))
      .collect();
    let mut scored: Vec<(f64, Rc<Derivation>)> =
      softmax(&logits).into_iter().zip(parses).collect();
    sort_scored(&mut scored);
    Ok(scored)
  }

  fn scores_and_denotations(&self, s: &str) -> Result<Vec<(f64, Value)>, Error> {
    let mut out: Vec<(f64, Value)> = Vec::new();
    for (p, d) in self.scores_and_parses(s)? {
      let denotation = d.denotation()?;
      if let Some(entry) = out.iter_mut().find(|(_, seen)| *seen == denotation) {
        entry.0 += p;
      } else {
        out.push((p, denotation));
      }
    }
    sort_scored(&mut out);
    Ok(out)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dot_treats_absent_weights_as_zero() {
    let mut weights = HashMap::new();
    weights.insert("a".to_string(), 2.0);
    let mut features = FeatureMap::new();
    features.insert("a".to_string(), 3.0);
    features.insert("b".to_string(), 100.0);
    assert_eq!(dot(&weights, &features), 6.0);
  }

  #[test]
  fn sort_is_descending_and_stable() {
    let mut scored = vec![(0.0, 'a'), (1.0, 'b'), (0.0, 'c')];
    sort_scored(&mut scored);
    assert_eq!(scored, vec![(1.0, 'b'), (0.0, 'a'), (0.0, 'c')]);
  }

  #[test]
  fn softmax_is_stable_for_large_logits() {
    let probs = softmax(&[1000.0, 1000.0]);
    assert!((probs[0] - 0.5).abs() < 1e-12);
    assert!((probs[1] - 0.5).abs() < 1e-12);
    assert!(probs.iter().all(|p| p.is_finite()));

    assert!(softmax(&[]).is_empty());
    let sum: f64 = softmax(&[-3.0, 0.0, 5.0]).iter().sum();
    assert!((sum - 1.0).abs() < 1e-12);
  }

  #[test]
  fn lazy_l2_decays_by_elapsed_steps() {
    let mut weights = HashMap::new();
    weights.insert("f".to_string(), 1.0);
    let mut lazy = LazyL2::new(0.1, 0.1); // factor 0.99

    lazy.catch_up(&mut weights, "f", 3);
    assert!((weights["f"] - 0.99f64.powi(3)).abs() < 1e-12);

    // already settled at 3; no further decay
    lazy.catch_up(&mut weights, "f", 3);
    assert!((weights["f"] - 0.99f64.powi(3)).abs() < 1e-12);

    lazy.flush(&mut weights, 5);
    assert!((weights["f"] - 0.99f64.powi(5)).abs() < 1e-12);
  }
}
