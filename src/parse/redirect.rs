use std::fmt;

use super::CommandLine;

/// Stream substitution requested by a command line. At most one per command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Redirection {
    #[default]
    None,
    /// `>`
    StdoutTruncate(String),
    /// `>>`
    StdoutAppend(String),
    /// `<`
    StdinRead(String),
    /// `2>`, installed on the standard output slot
    StderrAppend(String),
}

impl Redirection {
    fn from_operator(operator: &str, target: String) -> Option<Self> {
        match operator {
            ">" => Some(Redirection::StdoutTruncate(target)),
            ">>" => Some(Redirection::StdoutAppend(target)),
            "<" => Some(Redirection::StdinRead(target)),
            "2>" => Some(Redirection::StderrAppend(target)),
            _ => None,
        }
    }

    pub fn operator(&self) -> Option<&'static str> {
        match self {
            Redirection::None => None,
            Redirection::StdoutTruncate(_) => Some(">"),
            Redirection::StdoutAppend(_) => Some(">>"),
            Redirection::StdinRead(_) => Some("<"),
            Redirection::StderrAppend(_) => Some("2>"),
        }
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            Redirection::None => None,
            Redirection::StdoutTruncate(target)
            | Redirection::StdoutAppend(target)
            | Redirection::StdinRead(target)
            | Redirection::StderrAppend(target) => Some(target),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Redirection::None)
    }
}

pub fn is_operator(token: &str) -> bool {
    matches!(token, ">" | ">>" | "<" | "2>")
}

/// A command ready for the launcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandPlan {
    pub args: Vec<String>,
    pub redirection: Redirection,
    pub background: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    MissingRedirectionTarget(String),
    EmptyCommand,
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::MissingRedirectionTarget(operator) => {
                write!(f, "missing file name after '{}'", operator)
            }
            PlanError::EmptyCommand => write!(f, "no command before redirection"),
        }
    }
}

impl std::error::Error for PlanError {}

/// Splits the first redirection operator and its file name off `args`.
///
/// Everything from the operator onwards is dropped from the returned command
/// vector; operators past the first one are never honored.
pub fn plan(mut args: Vec<String>) -> Result<(Vec<String>, Redirection), PlanError> {
    let Some(position) = args.iter().position(|arg| is_operator(arg)) else {
        return Ok((args, Redirection::None));
    };

    let mut rest = args.split_off(position).into_iter();
    let operator = rest.next().unwrap_or_default();
    let target = rest
        .next()
        .ok_or_else(|| PlanError::MissingRedirectionTarget(operator.clone()))?;

    let ignored: Vec<String> = rest.collect();
    if !ignored.is_empty() {
        log::warn!(
            "only one redirection is honored; ignoring trailing arguments {:?}",
            ignored
        );
    }

    let redirection = Redirection::from_operator(&operator, target)
        .ok_or_else(|| PlanError::MissingRedirectionTarget(operator.clone()))?;

    if args.is_empty() {
        return Err(PlanError::EmptyCommand);
    }

    log::debug!("redirection planned: {:?}", redirection);
    Ok((args, redirection))
}

/// Plans a whole tokenized line.
pub fn plan_line(line: CommandLine) -> Result<CommandPlan, PlanError> {
    let background = line.background;
    let (args, redirection) = plan(line.args)?;
    Ok(CommandPlan {
        args,
        redirection,
        background,
    })
}
