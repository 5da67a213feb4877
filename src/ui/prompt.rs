//! Interactive yes/no prompt

use std::io::{self, BufRead, Write};

/// Ask `question` and read one line of answer
///
/// Only `y`/`yes` (any case) counts as agreement. An empty line or EOF is a no.
pub fn confirm<R: BufRead, W: Write>(question: &str, input: &mut R, output: &mut W) -> io::Result<bool> {
  write!(output, "{} [y/N] ", question)?;
  output.flush()?;

  let mut answer = String::new();
  input.read_line(&mut answer)?;
  Ok(is_affirmative(&answer))
}

pub fn is_affirmative(answer: &str) -> bool {
  matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
