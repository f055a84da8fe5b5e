use std::fmt;

/// Historical upper bound on the length of one input line.
pub const MAX_LINE: usize = 80;
/// Historical upper bound on the number of arguments of one command.
pub const MAX_ARGS: usize = MAX_LINE / 2;

const BACKGROUND_MARKER: &str = "&";

/// One line of text as handed over by the input source, newline included.
///
/// A zero-length line means the input source reached end of stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    text: String,
}

impl RawLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn end_of_input() -> Self {
        Self {
            text: String::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_end_of_input(&self) -> bool {
        self.text.is_empty()
    }
}

/// Owned argument vector plus the background flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    pub args: Vec<String>,
    pub background: bool,
}

impl CommandLine {
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn program(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    EndOfInput,
    LineTooLong { length: usize, limit: usize },
    TooManyArguments { limit: usize },
    ArgumentAfterBackground(String),
}

impl fmt::Display for TokenizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenizeError::EndOfInput => write!(f, "end of input"),
            TokenizeError::LineTooLong { length, limit } => {
                write!(f, "line too long: {} characters (limit {})", length, limit)
            }
            TokenizeError::TooManyArguments { limit } => {
                write!(f, "too many arguments (limit {})", limit)
            }
            TokenizeError::ArgumentAfterBackground(token) => write!(
                f,
                "no arguments allowed after background marker '&' (found '{}')",
                token
            ),
        }
    }
}

impl std::error::Error for TokenizeError {}

#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    max_line: usize,
    max_args: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(MAX_LINE, MAX_ARGS)
    }
}

impl Tokenizer {
    pub fn new(max_line: usize, max_args: usize) -> Self {
        Self { max_line, max_args }
    }

    /// Splits a freshly read line into arguments.
    pub fn tokenize(&self, raw: &RawLine) -> Result<CommandLine, TokenizeError> {
        if raw.is_end_of_input() {
            return Err(TokenizeError::EndOfInput);
        }

        let line = first_line(raw.as_str());
        let length = line.chars().count();
        if length > self.max_line {
            return Err(TokenizeError::LineTooLong {
                length,
                limit: self.max_line,
            });
        }

        self.split(line)
    }

    /// Splits a stored command line (a bookmark) into arguments.
    ///
    /// The stored text is not subject to the input length bound and may still
    /// carry the quotes it was entered with.
    pub fn tokenize_stored(&self, stored: &str) -> Result<CommandLine, TokenizeError> {
        self.split(strip_quotes(first_line(stored).trim()))
    }

    fn split(&self, line: &str) -> Result<CommandLine, TokenizeError> {
        let mut command = CommandLine::default();

        for word in line.split([' ', '\t']).filter(|word| !word.is_empty()) {
            if command.background {
                return Err(TokenizeError::ArgumentAfterBackground(word.to_owned()));
            }
            if word == BACKGROUND_MARKER {
                command.background = true;
                continue;
            }
            if command.args.len() == self.max_args {
                return Err(TokenizeError::TooManyArguments {
                    limit: self.max_args,
                });
            }
            command.args.push(word.to_owned());
        }

        Ok(command)
    }
}

fn first_line(text: &str) -> &str {
    text.split_once('\n').map_or(text, |(line, _)| line)
}

/// Removes one pair of matching surrounding quotes, if present.
pub fn strip_quotes(text: &str) -> &str {
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokenize(text: &str) -> Result<CommandLine, TokenizeError> {
        Tokenizer::default().tokenize(&RawLine::new(text))
    }

    #[test]
    fn test_plain_words() {
        let line = tokenize("ls -l /tmp\n").expect("tokenize");
        assert_eq!(line.args, vec!["ls", "-l", "/tmp"]);
        assert!(!line.background);
    }

    #[test]
    fn test_token_count_matches_words() {
        for words in [vec!["a"], vec!["a", "b"], vec!["cat", "x", "y", "z", "w"]] {
            let line = tokenize(&format!("{}\n", words.join(" "))).expect("tokenize");
            assert_eq!(line.args.len(), words.len());
            assert!(!line.background);
        }
    }

    #[test]
    fn test_background_marker() {
        let line = tokenize("ls -l &\n").expect("tokenize");
        assert_eq!(line.args, vec!["ls", "-l"]);
        assert!(line.background);
    }

    #[test]
    fn test_embedded_ampersand_is_a_word() {
        let line = tokenize("echo a&b\n").expect("tokenize");
        assert_eq!(line.args, vec!["echo", "a&b"]);
        assert!(!line.background);
    }

    #[test]
    fn test_argument_after_background_marker() {
        assert_eq!(
            tokenize("sleep 5 & now\n"),
            Err(TokenizeError::ArgumentAfterBackground("now".to_string()))
        );
        assert!(tokenize("sleep 5 & &\n").is_err());
    }

    #[test]
    fn test_tabs_and_runs_of_blanks() {
        let line = tokenize("  echo\t\t hello   world \n").expect("tokenize");
        assert_eq!(line.args, vec!["echo", "hello", "world"]);
    }

    #[test]
    fn test_newline_ends_scan() {
        let line = tokenize("echo one\necho two\n").expect("tokenize");
        assert_eq!(line.args, vec!["echo", "one"]);
    }

    #[test]
    fn test_blank_line_is_empty_command() {
        let line = tokenize("\n").expect("tokenize");
        assert!(line.is_empty());
        assert_eq!(line.program(), None);
    }

    #[test]
    fn test_zero_length_is_end_of_input() {
        assert_eq!(
            Tokenizer::default().tokenize(&RawLine::end_of_input()),
            Err(TokenizeError::EndOfInput)
        );
    }

    #[test]
    fn test_line_length_limit() {
        let long = format!("echo {}\n", "x".repeat(MAX_LINE));
        assert!(matches!(
            tokenize(&long),
            Err(TokenizeError::LineTooLong { limit: MAX_LINE, .. })
        ));
    }

    #[test]
    fn test_argument_limit() {
        let tokenizer = Tokenizer::new(200, 3);
        let result = tokenizer.tokenize(&RawLine::new("a b c d\n"));
        assert_eq!(result, Err(TokenizeError::TooManyArguments { limit: 3 }));
    }

    #[test]
    fn test_stored_line_matches_typed_line() {
        let tokenizer = Tokenizer::default();
        let typed = tokenizer
            .tokenize(&RawLine::new("sleep 5 &\n"))
            .expect("typed");
        let stored = tokenizer.tokenize_stored("\"sleep 5 &\"").expect("stored");
        assert_eq!(typed, stored);

        let stored = tokenizer.tokenize_stored("ls -la").expect("stored");
        assert_eq!(stored.args, vec!["ls", "-la"]);
        assert!(!stored.background);
    }

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("\"ls -l\""), "ls -l");
        assert_eq!(strip_quotes("'ls'"), "ls");
        assert_eq!(strip_quotes("\"unbalanced"), "\"unbalanced");
        assert_eq!(strip_quotes("\""), "\"");
    }
}
