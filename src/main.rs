use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::interpreter::Interpreter;
use rox::parser::Parser;
use rox::scanner::Scanner;
use rox::Lox;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Option<Commands>,

    /// Enable logging to a file
    #[arg(long, global = true)]
    log: bool,

    /// File that --log writes to
    #[arg(long, global = true, default_value = "app.log")]
    log_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print one JSON object per token
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: PathBuf },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: PathBuf },

    /// Runs input from a file as a Lox program
    Run { filename: PathBuf },

    /// Interactive prompt (the default)
    Repl,
}

/// Reads a whole source file as UTF‑8.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let bytes: Vec<u8> =
        std::fs::read(filename).context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes.len(), filename);

    String::from_utf8(bytes).context(format!("File {:?} is not valid UTF-8", filename))
}

fn init_logger(path: &Path) -> Result<()> {
    let log_file = File::create(path).context(format!("Failed to create {:?}", path))?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'rox::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to {:?}", path);
    Ok(())
}

fn tokenize(filename: &Path, json: bool) -> Result<i32> {
    let source: String = read_file(filename)?;
    let mut tokenized = true;

    for token in Scanner::new(&source) {
        match token {
            Ok(token) => {
                if json {
                    println!("{}", serde_json::to_string(&token)?);
                } else {
                    println!("{}", token);
                }
            }

            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed");
        return Ok(65);
    }

    Ok(0)
}

fn parse(filename: &Path) -> Result<i32> {
    let source: String = read_file(filename)?;
    let (tokens, errors) = Scanner::new(&source).scan_tokens();

    for e in &errors {
        eprintln!("{}", e);
    }

    match Parser::new(tokens).parse_expression() {
        Ok(expr) if errors.is_empty() => {
            println!("{}", AstPrinter::print(&expr));
            Ok(0)
        }

        Ok(_) => Ok(65),

        Err(e) => {
            eprintln!("{}", e);
            Ok(65)
        }
    }
}

fn evaluate(filename: &Path) -> Result<i32> {
    let source: String = read_file(filename)?;
    let (tokens, errors) = Scanner::new(&source).scan_tokens();

    for e in &errors {
        eprintln!("{}", e);
    }

    let expr = match Parser::new(tokens).parse_expression() {
        Ok(expr) if errors.is_empty() => expr,

        Ok(_) => return Ok(65),

        Err(e) => {
            eprintln!("{}", e);
            return Ok(65);
        }
    };

    let mut interpreter = Interpreter::new();

    match interpreter.evaluate(&expr) {
        Ok(value) => {
            println!("{}", value);
            Ok(0)
        }

        Err(e) => {
            eprintln!("{}", e);
            Ok(70)
        }
    }
}

fn run(filename: &Path) -> Result<i32> {
    let source: String = read_file(filename)?;

    let mut lox = Lox::new();
    lox.run(&source);

    Ok(lox.diagnostics().exit_code())
}

fn repl() -> Result<i32> {
    info!("Starting REPL");

    let mut lox = Lox::new();
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            break;
        }

        lox.run(&line);

        // An error on one line must not poison the next.
        lox.reset_diagnostics();
    }

    Ok(0)
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger(&args.log_file)?;
    } else {
        Builder::new().filter_level(log::LevelFilter::Off).init();
    }

    info!("CLI arguments: {:?}", args);

    let code: i32 = match args.commands.unwrap_or(Commands::Repl) {
        Commands::Tokenize { filename, json } => tokenize(&filename, json)?,
        Commands::Parse { filename } => parse(&filename)?,
        Commands::Evaluate { filename } => evaluate(&filename)?,
        Commands::Run { filename } => run(&filename)?,
        Commands::Repl => repl()?,
    };

    if code != 0 {
        debug!("Exiting with code {}", code);
        std::process::exit(code);
    }

    Ok(())
}
