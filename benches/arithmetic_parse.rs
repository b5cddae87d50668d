use criterion::{black_box, criterion_group, criterion_main, Criterion};

use denote::domains::arithmetic;
use denote::parser::Parser;

fn parse(p: &Parser, input: &str) -> usize {
  p.parse(input).unwrap().len()
}

fn criterion_benchmark(c: &mut Criterion) {
  let parser = arithmetic::parser().unwrap();
  let short_input = "one plus two";
  let long_input = "what is one plus two minus 3 times 4 to the two";

  c.bench_function("parse short", |b| {
    b.iter(|| parse(black_box(&parser), black_box(short_input)))
  });

  c.bench_function("parse long", |b| {
    b.iter(|| parse(black_box(&parser), black_box(long_input)))
  });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
