use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use rustyline::{config::Configurer, error::ReadlineError, history::FileHistory, Editor};

use super::{CommandCompleter, ShellCompleter};
use crate::core::config::Config;
use crate::core::jobs::Confirm;
use crate::error::ShellError;
use crate::parse::RawLine;

/// Where command lines come from.
pub enum InputSource {
    /// Line editor on a terminal, with history, completion and highlighting.
    Interactive {
        editor: Editor<ShellCompleter, FileHistory>,
        history_file: PathBuf,
    },
    /// Plain lines from a pipe or file; no prompt is shown.
    Piped(Box<dyn BufRead>),
}

impl InputSource {
    /// Interactive when stdin is a terminal, piped otherwise.
    pub fn from_stdin(config: &Config, commands: CommandCompleter) -> Result<Self, ShellError> {
        if io::stdin().is_terminal() {
            Self::interactive(config, commands)
        } else {
            Ok(Self::piped(io::BufReader::new(io::stdin())))
        }
    }

    pub fn interactive(config: &Config, commands: CommandCompleter) -> Result<Self, ShellError> {
        let mut editor = Editor::<ShellCompleter, FileHistory>::new()?;
        editor.set_helper(Some(ShellCompleter::new(commands)));
        editor.set_auto_add_history(false);
        editor.set_max_history_size(config.history_size)?;

        if config.history_file.exists() {
            if let Err(e) = editor.load_history(&config.history_file) {
                log::warn!(
                    "could not load history from {}: {}",
                    config.history_file.display(),
                    e
                );
            }
        }

        Ok(InputSource::Interactive {
            editor,
            history_file: config.history_file.clone(),
        })
    }

    pub fn piped(reader: impl BufRead + 'static) -> Self {
        InputSource::Piped(Box::new(reader))
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, InputSource::Interactive { .. })
    }

    /// Reads the next line, newline included. End of input gives an empty
    /// line. An interrupt at the prompt discards the line and prompts again.
    pub fn read_line(&mut self, prompt: &str) -> Result<RawLine, ShellError> {
        match self {
            InputSource::Interactive { editor, .. } => loop {
                match editor.readline(prompt) {
                    Ok(line) => {
                        if !line.trim().is_empty() {
                            if let Err(e) = editor.add_history_entry(line.as_str()) {
                                log::warn!("could not add history entry: {}", e);
                            }
                        }
                        return Ok(RawLine::new(format!("{}\n", line)));
                    }
                    Err(ReadlineError::Interrupted) => continue,
                    Err(ReadlineError::Eof) => return Ok(RawLine::end_of_input()),
                    Err(e) => return Err(e.into()),
                }
            },
            InputSource::Piped(reader) => {
                let mut line = String::new();
                reader.read_line(&mut line)?;
                Ok(RawLine::new(line))
            }
        }
    }

    pub fn save_history(&mut self) -> Result<(), ShellError> {
        if let InputSource::Interactive {
            editor,
            history_file,
        } = self
        {
            if let Some(parent) = history_file.parent() {
                std::fs::create_dir_all(parent)?;
            }
            editor.save_history(history_file)?;
            log::debug!("history saved to {}", history_file.display());
        }
        Ok(())
    }
}

impl Confirm for InputSource {
    fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        match self {
            InputSource::Interactive { editor, .. } => match editor.readline(question) {
                Ok(answer) => Ok(Some(answer)),
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
                Err(ReadlineError::Io(e)) => Err(e),
                Err(e) => Err(io::Error::other(e.to_string())),
            },
            InputSource::Piped(reader) => {
                print!("{}", question);
                io::stdout().flush()?;
                let mut answer = String::new();
                match reader.read_line(&mut answer)? {
                    0 => Ok(None),
                    _ => Ok(Some(answer.trim_end().to_string())),
                }
            }
        }
    }
}
