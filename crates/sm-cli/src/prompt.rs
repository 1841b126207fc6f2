//! Interactive per-file confirmation on the terminal.

use std::io::{BufRead, Write};

use camino::Utf8Path;
use parking_lot::Mutex;
use sm_apply::FileConfirmation;

/// Asks `[y/N/a/q]` on stderr for each file.
///
/// `a` accepts the rest; `q` declines the rest.
#[derive(Debug, Default)]
pub struct TerminalPrompt {
    sticky: Mutex<Option<bool>>,
}

/// Interprets one answer line.
fn parse_answer(line: &str) -> (bool, Option<bool>) {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => (true, None),
        "a" | "all" => (true, Some(true)),
        "q" | "quit" => (false, Some(false)),
        _ => (false, None),
    }
}

impl FileConfirmation for TerminalPrompt {
    fn confirm(&self, path: &Utf8Path, description: &str) -> bool {
        let mut sticky = self.sticky.lock();
        if let Some(answer) = *sticky {
            return answer;
        }

        let stderr = std::io::stderr();
        let mut handle = stderr.lock();
        let _ = write!(handle, "{path}: {description}\n  write this file? [y/N/a/q] ");
        let _ = handle.flush();

        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        let (answer, rest) = parse_answer(&line);
        *sticky = rest;
        answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answers() {
        assert_eq!(parse_answer("y\n"), (true, None));
        assert_eq!(parse_answer("YES"), (true, None));
        assert_eq!(parse_answer("a"), (true, Some(true)));
        assert_eq!(parse_answer("q"), (false, Some(false)));
        assert_eq!(parse_answer("\n"), (false, None));
        assert_eq!(parse_answer("maybe"), (false, None));
    }
}
