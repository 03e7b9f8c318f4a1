// ABOUTME: CLI entry point: REPL, script runner, and the standard IoHandle

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::{Config, Editor};
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};
use unitlang::config;
use unitlang::error::LangError;
use unitlang::highlighter::UnitHelper;
use unitlang::interpreter::{new_module_cache, HandleRef, Interpreter, IoHandle, ModuleCache};
use unitlang::lexer;
use unitlang::parser::{Assoc, ParserRef, Priority};
use unitlang::value::Value;

/// A small functional language with first-class tables, symbols, and
/// SI-dimensioned decimal arithmetic
#[derive(Parser, Debug)]
#[command(name = "unitlang")]
#[command(version = config::VERSION)]
#[command(about = "A small functional language with dimensioned decimals")]
struct CliArgs {
    /// Script file to execute (starts a REPL when omitted)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Evaluate one source string and print the last value
    #[arg(short = 'e', long = "eval", value_name = "EXPR")]
    eval: Option<String>,

    /// Dump the token stream instead of evaluating
    #[arg(long = "tokens")]
    tokens: bool,

    /// Start with an empty environment instead of the prelude
    #[arg(long = "no-prelude")]
    no_prelude: bool,
}

/// The production handle: stdin/stdout, process exit, and file-based
/// module resolution (`<name>.ul` next to the requesting file).
struct StdIoHandle {
    me: Weak<StdIoHandle>,
    modules: ModuleCache,
}

impl StdIoHandle {
    fn shared() -> Rc<Self> {
        Rc::new_cyclic(|me| StdIoHandle {
            me: me.clone(),
            modules: new_module_cache(),
        })
    }
}

impl IoHandle for StdIoHandle {
    fn read_line(&self) -> String {
        let mut line = String::new();
        let _ = std::io::stdin().read_line(&mut line);
        line.trim_end_matches(['\n', '\r']).to_string()
    }

    fn write_line(&self, line: &str) {
        println!("{}", line);
    }

    fn exit(&self) {
        std::process::exit(0);
    }

    fn resolve_module(&self, from: &str, name: &str) -> Option<Result<Value, LangError>> {
        let path = module_path(from, name);
        let source = std::fs::read_to_string(&path).ok()?;
        let handle: HandleRef = self.me.upgrade()?;
        // the child shares this handle's module cache, so the whole
        // import graph is memoised and cycle-checked together
        let child = Interpreter::with_parts(
            handle,
            None,
            None,
            Some(self.modules.clone()),
            Some(path.display().to_string()),
        );
        Some(child.run_multiline_return_last(&source))
    }
}

/// `<dir of requesting file>/<name>.ul`; pseudo-locations like
/// `<repl>` resolve against the current directory.
fn module_path(from: &str, name: &str) -> PathBuf {
    let base = Path::new(from)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    base.join(format!("{}.ul", name))
}

/// Build the session for any CLI path; `--no-prelude` swaps the full
/// prelude for an empty root environment.
fn build_interpreter(
    handle: HandleRef,
    modules: ModuleCache,
    location: String,
    no_prelude: bool,
) -> Interpreter {
    if no_prelude {
        Interpreter::without_prelude(None, Some(location))
    } else {
        Interpreter::with_parts(handle, None, None, Some(modules), Some(location))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let handle = StdIoHandle::shared();
    let modules = handle.modules.clone();
    let as_handle: HandleRef = handle;

    if let Some(source) = args.eval {
        if args.tokens {
            return dump_tokens(&source);
        }
        let interp = build_interpreter(
            as_handle,
            modules,
            "<eval>".to_string(),
            args.no_prelude,
        );
        return match interp.run_multiline_return_last(&source) {
            Ok(value) => {
                println!("{}", value);
                Ok(())
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        };
    }

    if let Some(path) = args.script {
        let source = std::fs::read_to_string(&path)
            .map_err(|e| format!("Cannot read script {}: {}", path.display(), e))?;
        if args.tokens {
            return dump_tokens(&source);
        }
        let interp = build_interpreter(
            as_handle,
            modules,
            path.display().to_string(),
            args.no_prelude,
        );
        return match interp.run_multiline(&source) {
            // scripts only print through IO:print
            Ok(_) => Ok(()),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        };
    }

    let interp = build_interpreter(
        as_handle,
        modules,
        "<repl>".to_string(),
        args.no_prelude,
    );
    repl(&interp)
}

fn dump_tokens(source: &str) -> Result<(), Box<dyn std::error::Error>> {
    match lexer::lex_with_ws(source) {
        Ok(tokens) => {
            for token in tokens {
                println!("{:>5}  {:<10} {:?}", token.offset, format!("{:?}", token.kind), token.text);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// `#!prec OP STRENGTH left|right` — rebind an operator between
/// top-level expressions.
fn set_priority(options: &ParserRef, rest: &str) -> Result<String, String> {
    const USAGE: &str = "usage: #!prec OP STRENGTH left|right";
    let parts: Vec<&str> = rest.split_whitespace().collect();
    let [op, strength, assoc] = parts.as_slice() else {
        return Err(USAGE.to_string());
    };
    let strength: i32 = strength.parse().map_err(|_| USAGE.to_string())?;
    let assoc_value = match *assoc {
        "left" => Assoc::Left,
        "right" => Assoc::Right,
        _ => return Err(USAGE.to_string()),
    };
    options
        .borrow_mut()
        .set_priority(op, Priority::new(strength, assoc_value));
    Ok(format!("{} now binds at ({}, {})", op, strength, assoc))
}

fn repl(interp: &Interpreter) -> Result<(), Box<dyn std::error::Error>> {
    let rl_config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<UnitHelper, FileHistory> = Editor::with_config(rl_config)
        .map_err(|e| format!("Failed to initialize REPL: {}", e))?;
    rl.set_helper(Some(UnitHelper::new()));
    let _ = rl.load_history(config::HISTORY_FILE);

    println!("{}", config::WELCOME_MESSAGE);
    println!("{}", config::WELCOME_SUBTITLE);
    println!("{}", config::WELCOME_FOOTER);

    loop {
        match rl.readline(config::PROMPT) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match trimmed {
                    "quit" | "exit" => break,
                    "help" => {
                        println!("{}", config::HELP_TEXT);
                        continue;
                    }
                    _ => {}
                }
                if let Some(rest) = trimmed.strip_prefix("#!prec") {
                    match set_priority(interp.options(), rest) {
                        Ok(msg) => println!("{}", msg),
                        Err(msg) => eprintln!("{}", msg),
                    }
                    continue;
                }
                match interp.run_multiline(&line) {
                    Ok(values) => {
                        if let Some(last) = values.last() {
                            println!("=> {}", last);
                        }
                    }
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                // interrupt while reading: offer to leave
                match rl.readline("Exit [y/n]? ") {
                    Ok(answer) if matches!(answer.trim(), "y" | "Y" | "yes") => break,
                    Ok(_) => continue,
                    Err(_) => break,
                }
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(config::HISTORY_FILE);
    println!("Goodbye!");
    Ok(())
}
