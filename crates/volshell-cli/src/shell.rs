//! Line-driven front end over a [`Session`].

use std::io::{self, BufRead, IsTerminal, Write};

use owo_colors::OwoColorize;
use volshell_core::{LayerSource, Session};

/// Words that end the prompt loop.
const EXIT_WORDS: [&str; 3] = ["exit", "quit", "q"];

/// Print a failed command to stderr, in red when stderr is a terminal.
pub fn report_error(error: &volshell_core::Error) {
    let label = if error.is_recoverable() {
        "Error"
    } else {
        "Fatal error"
    };
    let message = format!("{}: {}", label, error);
    if io::stderr().is_terminal() {
        eprintln!("{}", message.red());
    } else {
        eprintln!("{}", message);
    }
}

/// Run a single command given as separate words.
pub fn run_command<S, W>(session: &mut Session<'_, S>, words: &[String], out: &mut W) -> bool
where
    S: LayerSource + ?Sized,
    W: Write,
{
    let line = words.join(" ");
    match session.execute_line(out, &line) {
        Ok(()) => true,
        Err(e) => {
            report_error(&e);
            false
        }
    }
}

/// Prompt for commands until end of input or an exit word.
///
/// A failing command is reported and the loop carries on.
pub fn run_interactive<S, R, W>(session: &mut Session<'_, S>, input: R, out: &mut W) -> io::Result<()>
where
    S: LayerSource + ?Sized,
    R: BufRead,
    W: Write,
{
    writeln!(out)?;
    writeln!(out, "Call help (or hh) to see available commands")?;
    writeln!(out)?;

    let mut lines = input.lines();
    loop {
        write!(out, "{}", session.prompt())?;
        out.flush()?;

        let Some(line) = lines.next() else {
            writeln!(out)?;
            break;
        };
        let line = line?;
        if EXIT_WORDS.contains(&line.trim()) {
            break;
        }

        if let Err(e) = session.execute_line(out, &line) {
            report_error(&e);
        }
    }

    Ok(())
}
