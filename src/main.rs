use clap::{Args, Parser as ClapParser, Subcommand};
use simple_lang::{
    CodeKind, SimpleLanguageConfig,
    cli::{self, CliError, RunOptions, RunResult},
};
use std::io::{self, Read};

#[derive(ClapParser)]
#[command(name = "simple")]
#[command(about = "Simple - template expressions and predicates for message routing")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a template expression
    Eval(RunArgs),

    /// Evaluate a predicate
    Check(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// The expression or predicate
    text: String,

    /// Exchange JSON (reads from stdin if not provided)
    #[arg(short, long)]
    input: Option<String>,

    /// Pretty-print the output
    #[arg(short, long)]
    pretty: bool,

    /// Only validate syntax, don't evaluate
    #[arg(long)]
    syntax_only: bool,

    /// Print the generated code instead of evaluating
    #[arg(long)]
    code: bool,

    /// Compiled entries kept per cache, 0 disables caching
    #[arg(long, default_value_t = 1000)]
    cache_size: usize,

    /// Keep backslash escapes as written
    #[arg(long)]
    no_escape: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env().filter_level(level).init();

    let result = match cli.command {
        Commands::Eval(args) => run(CodeKind::Expression, args),
        Commands::Check(args) => run(CodeKind::Predicate, args),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run(kind: CodeKind, args: RunArgs) -> Result<(), CliError> {
    let input = match args.input {
        Some(s) => Some(s),
        None if !args.code && !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer).filter(|b| !b.trim().is_empty())
        }
        None => None,
    };

    let options = RunOptions {
        text: args.text,
        input,
        syntax_only: args.syntax_only,
        code: args.code,
        config: SimpleLanguageConfig {
            cache_max_size: args.cache_size,
            allow_escape: !args.no_escape,
        },
    };

    match cli::execute(kind, &options)? {
        RunResult::SyntaxValid => println!("Syntax is valid"),
        RunResult::Code(code) => println!("{}", code),
        RunResult::Success(output) => {
            let json = if args.pretty {
                serde_json::to_string_pretty(&output)
            } else {
                serde_json::to_string(&output)
            }?;
            println!("{}", json);
        }
    }
    Ok(())
}
