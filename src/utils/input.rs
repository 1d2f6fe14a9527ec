use std::io::{self, BufRead, Write};

use crate::error::{Error, Result};

/// Prompts until the user enters a number. End of input is an error.
pub fn get_input<R: BufRead, W: Write>(prompt: &str, input: &mut R, output: &mut W) -> Result<f64> {
    loop {
        write!(output, "{prompt}")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(Error::InvalidInput(format!("no value entered for {prompt}")));
        }

        match line.trim().parse() {
            Ok(num) => return Ok(num),
            Err(_) => writeln!(output, "Please enter a valid number")?,
        }
    }
}

pub fn get_stdin_input(prompt: &str) -> Result<f64> {
    let stdin = io::stdin();
    get_input(prompt, &mut stdin.lock(), &mut io::stdout())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retries_until_a_number_arrives() {
        let mut input = "abc\n\n 12.5 \n".as_bytes();
        let mut output = Vec::new();
        let value = get_input("temp_c: ", &mut input, &mut output).unwrap();
        assert_eq!(value, 12.5);

        let shown = String::from_utf8(output).unwrap();
        assert_eq!(shown.matches("temp_c: ").count(), 3);
        assert_eq!(shown.matches("Please enter a valid number").count(), 2);
    }

    #[test]
    fn end_of_input_is_an_error() {
        let mut input = "".as_bytes();
        assert!(get_input("hour: ", &mut input, &mut Vec::new()).is_err());
    }
}
