use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use route_expr::expr::{compile, Registry};
use route_expr::route::Session;
use route_expr::store::VariableStore;
use route_expr::RouteError;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile and evaluate a single expression
    Eval {
        /// The expression to evaluate
        expr: String,

        /// Set a variable before evaluating (repeatable)
        #[arg(short, long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, f64)>,
    },
    /// Print the compiled instruction sequence of an expression
    Disasm {
        /// The expression to compile
        expr: String,
    },
    /// Compile a session file and check its requirements
    Check {
        /// Path to the session file
        #[arg(short, long)]
        file: String,

        /// Apply the session's results once before checking
        #[arg(long)]
        visit: bool,

        /// Print a JSON report instead of plain text
        #[arg(long)]
        json: bool,
    },
}

fn parse_assignment(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    let name = name.trim().trim_matches('$');
    if name.is_empty() {
        return Err(format!("missing variable name in '{s}'"));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid value in '{s}': {e}"))?;
    Ok((name.to_string(), value))
}

fn main() -> ExitCode {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    match run(args.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> anyhow::Result<ExitCode> {
    let registry = Registry::builtin();

    match command {
        Commands::Eval { expr, set } => {
            let mut store = VariableStore::empty();
            for (name, value) in set {
                store.set(&name, value);
            }

            let expression = match compile(&expr, &registry, &mut store) {
                Ok(expression) => expression,
                Err(diags) => {
                    eprintln!("{diags}");
                    return Ok(ExitCode::FAILURE);
                }
            };

            let value = expression
                .evaluate(&store)
                .with_context(|| format!("evaluating `{expr}`"))?;
            println!("{value}");
        }
        Commands::Disasm { expr } => {
            let mut store = VariableStore::empty();
            match compile(&expr, &registry, &mut store) {
                Ok(expression) => println!("{}", expression.disassemble()),
                Err(diags) => {
                    eprintln!("{diags}");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Commands::Check { file, visit, json } => {
            let mut session = match Session::load(&file, registry) {
                Ok(session) => session,
                Err(RouteError::Entries(failures)) => {
                    for failure in &failures {
                        eprintln!("{failure}");
                    }
                    return Ok(ExitCode::FAILURE);
                }
                Err(e) => return Err(e).with_context(|| format!("loading session {file}")),
            };

            if visit {
                session.visit().context("visiting session")?;
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&session.report())?);
                return Ok(ExitCode::SUCCESS);
            }

            println!("Session: {}", session.name());
            let mut all_ok = true;
            for (name, outcome) in session.check_all() {
                match outcome {
                    Ok(met) => println!("  {name}: {}", if met { "met" } else { "not met" }),
                    Err(e) => {
                        all_ok = false;
                        println!("  {name}: error: {e}");
                    }
                }
            }
            if !all_ok {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
