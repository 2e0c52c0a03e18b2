// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use log::debug;
use std::io::{self, BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Abort,
}

impl Decision {
    pub fn proceeds(self) -> bool {
        self == Decision::Proceed
    }
}

/// Source of yes/no answers. `None` means no usable answer was received.
pub trait Prompt {
    fn ask(&mut self, prompt: &str) -> Option<String>;
}

/// Reads answers from an interactive terminal.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Prompt for TerminalPrompt<R, W> {
    fn ask(&mut self, prompt: &str) -> Option<String> {
        write!(self.output, "{prompt} [y/N]: ").ok()?;
        self.output.flush().ok()?;

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line),
            Err(e) => {
                debug!("failed to read confirmation answer: {e}");
                None
            }
        }
    }
}

/// Gates destructive actions behind an explicit yes/no answer.
pub struct ConfirmationGate<P> {
    prompt: P,
}

impl<P: Prompt> ConfirmationGate<P> {
    pub fn new(prompt: P) -> Self {
        Self { prompt }
    }

    #[cfg(test)]
    pub(crate) fn prompt(&self) -> &P {
        &self.prompt
    }

    /// Returns `Proceed` without prompting when `skip` is set. Anything other
    /// than an explicit yes aborts.
    pub fn confirm(&mut self, prompt: &str, skip: bool) -> Decision {
        if skip {
            debug!("confirmation skipped: {prompt}");
            return Decision::Proceed;
        }
        match self.prompt.ask(prompt).as_deref().map(parse_answer) {
            Some(true) => Decision::Proceed,
            _ => Decision::Abort,
        }
    }
}

fn parse_answer(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
