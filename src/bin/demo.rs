//! Interactive demo binary: wires `env_logger` the same way a typical
//! readline example binary does, then drives the library's synchronous
//! `Editor` in a plain read-eval-print loop.

use james_readline::{Editor, ReadlineError};

fn demo_completer(line: &str, index: usize) -> Option<String> {
    const COMMANDS: &[&str] = &["help", "history", "hello", "exit", "echo"];
    COMMANDS
        .iter()
        .filter(|c| c.starts_with(line))
        .nth(index)
        .map(|s| s.to_string())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut editor = match Editor::new(200) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("could not initialize the line editor: {e}");
            std::process::exit(1);
        }
    };
    editor.set_completer(demo_completer);

    println!("james-readline demo — Ctrl-R to search, Tab to complete, Ctrl-D to quit");

    loop {
        match editor.readline("readline> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                println!("you said: {line}");
            }
            Err(ReadlineError::Eof) => {
                println!("goodbye");
                break;
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(e) => {
                eprintln!("readline error: {e}");
                break;
            }
        }
    }
}
