//! Line-oriented prompts on stdin/stdout.

use std::io::{self, BufRead, Write};

use anyhow::{Result, bail};

/// What the user picked from a numbered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
  Item(usize),
  Back,
}

/// Print `label` and read one trimmed line. End of input is an error.
pub fn ask(label: &str) -> Result<String> {
  print!("{label}: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  if io::stdin().lock().read_line(&mut line)? == 0 {
    bail!("input closed");
  }
  Ok(line.trim().to_owned())
}

/// Show `items` numbered from 1 and keep asking until the answer is a valid
/// number or `b` for back.
pub fn choose(label: &str, items: &[String]) -> Result<Choice> {
  for (i, item) in items.iter().enumerate() {
    println!("  {:>2}) {item}", i + 1);
  }
  println!("   b) back");
  loop {
    let answer = ask(label)?;
    match parse_choice(&answer, items.len()) {
      Some(choice) => return Ok(choice),
      None => println!("pick 1-{} or b", items.len()),
    }
  }
}

pub fn parse_choice(answer: &str, len: usize) -> Option<Choice> {
  let answer = answer.trim();
  if answer.eq_ignore_ascii_case("b") || answer.eq_ignore_ascii_case("back") {
    return Some(Choice::Back);
  }
  let n: usize = answer.parse().ok()?;
  (1..=len).contains(&n).then(|| Choice::Item(n - 1))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn numbers_are_one_based() {
    assert_eq!(parse_choice("1", 3), Some(Choice::Item(0)));
    assert_eq!(parse_choice(" 3 ", 3), Some(Choice::Item(2)));
  }

  #[test]
  fn out_of_range_and_junk_are_rejected() {
    assert_eq!(parse_choice("0", 3), None);
    assert_eq!(parse_choice("4", 3), None);
    assert_eq!(parse_choice("dois", 3), None);
    assert_eq!(parse_choice("", 3), None);
  }

  #[test]
  fn back_is_accepted_in_any_case() {
    assert_eq!(parse_choice("b", 0), Some(Choice::Back));
    assert_eq!(parse_choice("BACK", 2), Some(Choice::Back));
  }
}
