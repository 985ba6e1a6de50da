use crate::domain::model::RunMode;
use std::io::{self, BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOutcome {
    Proceed(RunMode),
    Cancelled,
}

/// Asks for a sample or full run, then for confirmation.
///
/// End of input at either question cancels the run.
pub fn choose_run_mode<R, W>(
    input: &mut R,
    output: &mut W,
    sample_size: usize,
    discovered: usize,
) -> io::Result<PromptOutcome>
where
    R: BufRead,
    W: Write,
{
    let sample = sample_size.min(discovered);
    writeln!(output, "\n{} businesses ready.", discovered)?;
    writeln!(output, "  1) Sample run (first {})", sample)?;
    writeln!(output, "  2) Full run ({})", discovered)?;

    let mode = loop {
        write!(output, "Select [1/2]: ")?;
        output.flush()?;
        let Some(answer) = read_answer(input)? else {
            return Ok(PromptOutcome::Cancelled);
        };
        match answer.as_str() {
            "1" => break RunMode::Sample(sample_size),
            "2" => break RunMode::Full,
            _ => writeln!(output, "Please enter 1 or 2.")?,
        }
    };

    let count = mode.limit(discovered);
    loop {
        write!(output, "Generate slides for {} businesses? [y/n]: ", count)?;
        output.flush()?;
        let Some(answer) = read_answer(input)? else {
            return Ok(PromptOutcome::Cancelled);
        };
        match answer.to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(PromptOutcome::Proceed(mode)),
            "n" | "no" => return Ok(PromptOutcome::Cancelled),
            _ => writeln!(output, "Please enter y or n.")?,
        }
    }
}

fn read_answer<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn ask(script: &str) -> (PromptOutcome, String) {
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut output = Vec::new();
        let outcome = choose_run_mode(&mut input, &mut output, 10, 89).unwrap();
        (outcome, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_sample_confirmed() {
        let (outcome, text) = ask("1\ny\n");
        assert_eq!(outcome, PromptOutcome::Proceed(RunMode::Sample(10)));
        assert!(text.contains("first 10"));
        assert!(text.contains("for 10 businesses"));
    }

    #[test]
    fn test_invalid_choice_reprompts() {
        let (outcome, text) = ask("3\n\n2\nY\n");
        assert_eq!(outcome, PromptOutcome::Proceed(RunMode::Full));
        assert_eq!(text.matches("Please enter 1 or 2.").count(), 2);
        assert!(text.contains("for 89 businesses"));
    }

    #[test]
    fn test_declined_or_eof_cancels() {
        assert_eq!(ask("2\nn\n").0, PromptOutcome::Cancelled);
        assert_eq!(ask("").0, PromptOutcome::Cancelled);
        assert_eq!(ask("1\n").0, PromptOutcome::Cancelled);
    }
}
