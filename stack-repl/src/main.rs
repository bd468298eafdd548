mod error;
mod session;

use rustyline::{error::ReadlineError, DefaultEditor};
use session::Session;
use std::{fs::File, io::{self, BufReader, IsTerminal, Read}, process::ExitCode};

/// Runs each line of a script, stopping at the first failing command.
fn run_script(input: &str, session: &mut Session) -> Result<(), error::Error> {
    for line in input.lines().filter(|line| !line.trim().is_empty()) {
        let output = session.handle(line)?;
        if !output.is_empty() {
            println!("{}", output);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "stack_repl=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut session = match Session::new() {
        Ok(session) => session,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        },
    };

    let mut args = std::env::args();
    args.next();

    let script = if let Some(filename) = args.next() {
        // run a script file
        let mut input = String::new();
        if let Err(err) = File::open(&filename).and_then(|file| BufReader::new(file).read_to_string(&mut input)) {
            eprintln!("could not read `{}`: {}", filename, err);
            return ExitCode::FAILURE;
        }
        Some(input)
    } else if !io::stdin().is_terminal() {
        // read a script from stdin
        let mut input = String::new();
        if let Err(err) = io::stdin().read_to_string(&mut input) {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
        Some(input)
    } else {
        None
    };

    if let Some(input) = script {
        return match run_script(&input, &mut session) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("{}", err);
                ExitCode::FAILURE
            },
        };
    }

    // run the repl / interactive mode
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        },
    };

    fn process_line(rl: &mut DefaultEditor, session: &mut Session) -> Result<(), ReadlineError> {
        let input = rl.readline("> ")?;
        if input.trim().is_empty() {
            return Ok(());
        }

        rl.add_history_entry(&input)?;

        match session.handle(&input) {
            Ok(output) if output.is_empty() => (),
            Ok(output) => println!("{}", output),
            Err(err) => eprintln!("{}", err),
        }
        Ok(())
    }

    loop {
        if let Err(err) = process_line(&mut rl, &mut session) {
            match err {
                ReadlineError::Eof | ReadlineError::Interrupted => (),
                _ => eprintln!("{}", err),
            }
            break;
        }
    }
    ExitCode::SUCCESS
}
