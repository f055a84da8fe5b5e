//! Turning raw input lines into launchable command plans.

mod redirect;
mod tokenizer;

pub use redirect::{is_operator, plan, plan_line, CommandPlan, PlanError, Redirection};
pub use tokenizer::{
    strip_quotes, CommandLine, RawLine, TokenizeError, Tokenizer, MAX_ARGS, MAX_LINE,
};
