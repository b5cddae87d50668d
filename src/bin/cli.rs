use std::env;
use std::error::Error;
use std::io;
use std::io::Write;
use std::process;
use std::rc::Rc;

use denote::domains::{arithmetic, numbers};
use denote::ranker::{ConstantRanker, Ranker};

fn usage(prog_name: &str) -> String {
  format!(
    r"
Usage: {} [options]

Reads utterances like `what is two plus 40` from stdin and prints their
ranked denotations.

Options:
  -h, --help     Print this message
  -c, --chart    Print the parse chart (defaults to not printing)
  -p, --parses   Print scored parse trees (defaults to not printing)
  -t, --top      Print only the top denotation (defaults to printing all)
  --numbers      Use the number-word domain instead of arithmetic",
    prog_name
  )
}

struct Options {
  print_chart: bool,
  print_parses: bool,
  only_top: bool,
}

fn respond(ranker: &ConstantRanker, input: &str, opts: &Options) -> Result<(), Box<dyn Error>> {
  if opts.print_chart {
    println!("chart:\n{}", ranker.parser.parse_chart(input)?);
  }

  if opts.print_parses {
    for (score, parse) in ranker.scores_and_parses(input)? {
      println!("{:>8.3}  {}", score, parse);
    }
  }

  let scored = ranker.scores_and_denotations(input)?;
  if scored.is_empty() {
    println!("no parse");
  } else if opts.only_top {
    println!("{}", scored[0].1);
  } else {
    for (score, denotation) in scored {
      println!("{:>8.3}  {}", score, denotation);
    }
  }
  Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
  env_logger::init();

  let args: Vec<String> = env::args().collect();
  let prog_name = args[0].clone();

  let mut opts = Options {
    print_chart: false,
    print_parses: false,
    only_top: false,
  };
  let mut use_numbers = false;
  for a in args.into_iter().skip(1) {
    if a == "-h" || a == "--help" {
      println!("{}", usage(&prog_name));
      process::exit(0);
    } else if a == "-c" || a == "--chart" {
      opts.print_chart = true;
    } else if a == "-p" || a == "--parses" {
      opts.print_parses = true;
    } else if a == "-t" || a == "--top" {
      opts.only_top = true;
    } else if a == "--numbers" {
      use_numbers = true;
    } else {
      println!("unknown option {}\n{}", a, usage(&prog_name));
      process::exit(1);
    }
  }

  let parser = if use_numbers {
    numbers::parser()?
  } else {
    arithmetic::parser()?
  };
  let ranker = ConstantRanker {
    parser: Rc::new(parser),
  };

  let mut input = String::new();
  loop {
    print!("> ");
    io::stdout().flush()?;

    match io::stdin().read_line(&mut input) {
      Ok(_) => {
        if input.is_empty() {
          // ctrl+d
          return Ok(());
        }
        if !input.trim().is_empty() {
          respond(&ranker, input.trim(), &opts)?;
        }
        input.clear();
      }
      Err(error) => return Err(error.into()),
    }
  }
}
