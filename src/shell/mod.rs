//! The read-eval loop that ties input, builtins and the launcher together.

use std::fmt::Display;
use std::io::{self, Write};

mod executor;

use crate::{
    bookmark::BookmarkStore,
    core::{commands::Builtins, config::Config, jobs::JobController, state::SessionState},
    error::ShellError,
    flags::Flags,
    highlight::SyntaxHighlighter,
    input::{CommandCompleter, InputSource},
    parse::{TokenizeError, Tokenizer},
    path::PathList,
    process::signal,
    search::ContentSearch,
};

use executor::CommandHandler;

/// Result of one loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue(SessionState),
    Exit(i32),
}

pub struct Shell {
    pub(crate) config: Config,
    pub(crate) input: InputSource,
    pub(crate) tokenizer: Tokenizer,
    pub(crate) builtins: Builtins,
    pub(crate) bookmarks: BookmarkStore,
    pub(crate) search: ContentSearch,
    pub(crate) jobs: JobController,
    diagnostics: Box<dyn Write>,
    highlighter: SyntaxHighlighter,
}

impl Shell {
    /// Full start-up: config, search path check, signal handlers, input.
    pub fn new(flags: &Flags) -> Result<Self, ShellError> {
        let quiet = flags.is_set("quiet");
        let config = Config::load(flags.get_value("config").map(String::as_str))?;
        log::debug!("config: {:?}", config);

        let paths = PathList::from_env()?;
        log::debug!("search path has {} entries", paths.len());

        signal::setup_interrupt_handler(quiet)?;
        signal::install_suspend_handler()?;

        let bookmarks = BookmarkStore::open(config.bookmarks_file.clone())?;
        let builtins = Builtins::new();
        let commands = CommandCompleter::new(builtins.names(), Some(&paths));
        let input = InputSource::from_stdin(&config, commands)?;

        Ok(Self::with_parts(config, input, bookmarks, quiet))
    }

    pub fn with_parts(
        config: Config,
        input: InputSource,
        bookmarks: BookmarkStore,
        quiet: bool,
    ) -> Self {
        Shell {
            tokenizer: Tokenizer::new(config.max_line, config.max_args),
            search: ContentSearch::new(config.search_extensions.clone()),
            builtins: Builtins::new(),
            jobs: JobController::new(quiet),
            diagnostics: Box::new(io::stderr()),
            highlighter: SyntaxHighlighter::for_stderr(),
            config,
            input,
            bookmarks,
        }
    }

    /// Sends failure diagnostics to `out` instead of stderr, uncoloured.
    pub fn with_diagnostics(mut self, out: Box<dyn Write>) -> Self {
        self.diagnostics = out;
        self.highlighter = SyntaxHighlighter::plain();
        self
    }

    /// Runs until end of input or a confirmed exit; returns the exit code.
    pub fn run(&mut self) -> i32 {
        let mut state = SessionState::new();
        let code = loop {
            match self.iterate(state) {
                Step::Continue(next) => state = next,
                Step::Exit(code) => break code,
            }
        };

        if let Err(e) = self.input.save_history() {
            log::warn!("could not save history: {}", e);
        }
        code
    }

    pub fn iterate(&mut self, state: SessionState) -> Step {
        let state = match self.jobs.begin_iteration(state) {
            Ok(state) => state,
            Err(e) => {
                self.report(&e);
                state.reset()
            }
        };

        let raw = match self.input.read_line(&self.config.prompt) {
            Ok(raw) => raw,
            Err(e) => {
                self.report(&e);
                return Step::Continue(state);
            }
        };

        match self.tokenizer.tokenize(&raw) {
            Ok(line) => {
                log::debug!("tokenized {:?} (background: {})", line.args, line.background);
                self.execute_line(state, line, true)
            }
            Err(TokenizeError::EndOfInput) => {
                log::debug!("end of input");
                Step::Exit(0)
            }
            Err(e) => {
                self.report(&e);
                Step::Continue(state)
            }
        }
    }

    /// Prints a failure diagnostic. `--quiet` never silences these.
    pub(crate) fn report(&mut self, error: &dyn Display) {
        log::debug!("reported: {}", error);
        let message = self.highlighter.highlight_error(&format!("myshell: {}", error));
        if let Err(e) = writeln!(self.diagnostics, "{}", message) {
            log::error!("could not print diagnostic: {}", e);
        }
    }
}
