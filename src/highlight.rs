use std::io::{self, IsTerminal};

use inksac::prelude::*;

use crate::parse::is_operator;

#[derive(Debug, Clone, Copy)]
pub struct SyntaxHighlighter {
    color_support: ColorSupport,
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxHighlighter {
    pub fn new() -> Self {
        let support = check_color_support().unwrap_or(ColorSupport::NoColor);
        Self {
            color_support: support,
        }
    }

    /// Colours only when stderr is a terminal.
    pub fn for_stderr() -> Self {
        if io::stderr().is_terminal() {
            Self::new()
        } else {
            Self::plain()
        }
    }

    pub fn plain() -> Self {
        Self {
            color_support: ColorSupport::NoColor,
        }
    }

    fn enabled(&self) -> bool {
        !matches!(self.color_support, ColorSupport::NoColor)
    }

    /// Colours each word of `input` by its role. Whitespace is kept as typed
    /// so the cursor position stays valid.
    pub fn highlight_command(&self, input: &str) -> String {
        if !self.enabled() {
            return input.to_string();
        }

        let mut output = String::with_capacity(input.len() * 2);
        let mut word_index = 0;
        let mut after_operator = false;

        for (is_space, segment) in segments(input) {
            if is_space {
                output.push_str(segment);
                continue;
            }

            let style = if word_index == 0 {
                Some(Style::builder().foreground(Color::Cyan).bold().build())
            } else if is_operator(segment) {
                Some(Style::builder().foreground(Color::Magenta).bold().build())
            } else if segment == "&" {
                Some(Style::builder().foreground(Color::Blue).bold().build())
            } else if after_operator {
                Some(Style::builder().foreground(Color::Green).build())
            } else if segment.starts_with('-') {
                Some(Style::builder().foreground(Color::Yellow).build())
            } else {
                None
            };

            match style {
                Some(style) => output.push_str(&segment.style(style).to_string()),
                None => output.push_str(segment),
            }
            after_operator = word_index > 0 && is_operator(segment);
            word_index += 1;
        }

        output
    }

    pub fn highlight_error(&self, error: &str) -> String {
        if !self.enabled() {
            return error.to_string();
        }

        let error_style = Style::builder().foreground(Color::Red).bold().build();
        error.style(error_style).to_string()
    }

    pub fn highlight_hint(&self, hint: &str) -> String {
        if !self.enabled() {
            return hint.to_string();
        }

        let hint_style = Style::builder()
            .foreground(Color::RGB(128, 128, 128))
            .build();
        hint.style(hint_style).to_string()
    }
}

/// Splits `input` into alternating runs of whitespace and non-whitespace.
fn segments(input: &str) -> Vec<(bool, &str)> {
    let mut result = Vec::new();
    let mut start = 0;
    let mut current: Option<bool> = None;

    for (index, ch) in input.char_indices() {
        let is_space = ch.is_whitespace();
        match current {
            Some(kind) if kind != is_space => {
                result.push((kind, &input[start..index]));
                start = index;
                current = Some(is_space);
            }
            None => current = Some(is_space),
            _ => {}
        }
    }
    if let Some(kind) = current {
        result.push((kind, &input[start..]));
    }
    result
}
