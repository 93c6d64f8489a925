use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use scs_driver::report::{report_error, write_warnings};
use scs_driver::{Config, HostLoader, ProcessCompiler};
use scs_engine::{Engine, EngineError};

#[derive(Parser)]
#[command(
    name = "scs",
    version,
    about = "Compile and run single-file C# scripts",
    long_about = "Builds a C# script together with the libraries and scripts its\n\
                  //#ref and //#include directives name, then runs its entry point."
)]
struct Cli {
    /// Configuration file (defaults to $SCS_CONFIG or scs.toml beside scs)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Build without optimizations and with debug information
    #[arg(long, global = true)]
    debug: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script or a precompiled script module
    Run {
        /// Script source or script module
        script: PathBuf,

        /// Arguments passed to the script's Main
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Compile a script to a module without running it
    Compile {
        /// Script source
        script: PathBuf,

        /// Output module path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the mode and resolved dependencies of a script (debug)
    Deps {
        /// Script source
        script: PathBuf,
    },
}

type ScriptEngine = Engine<ProcessCompiler, HostLoader>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if cli.debug {
        config.engine.optimize = false;
    }

    let compiler = ProcessCompiler::new(config.compiler.program, config.compiler.args);
    let loader = HostLoader::new(config.host.program, config.host.args);
    let mut engine = Engine::new(config.engine, compiler, loader);

    let result = match cli.command {
        Commands::Run { script, args } => run_command(&mut engine, &script, &args),
        Commands::Compile { script, output } => compile_command(&mut engine, &script, output),
        Commands::Deps { script } => deps_command(&engine, &script),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("SCS_LOG")
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run_command(engine: &mut ScriptEngine, script: &Path, args: &[String]) -> Result<ExitCode, EngineError> {
    let code = engine.run(script, args)?;
    // process exit statuses are a single byte on most platforms
    Ok(ExitCode::from(code as u8))
}

fn compile_command(
    engine: &mut ScriptEngine,
    script: &Path,
    output: Option<PathBuf>,
) -> Result<ExitCode, EngineError> {
    let output = output.unwrap_or_else(|| script.with_extension("dll"));
    let warnings = engine.compile(script, &output)?;

    // a closed stderr must not turn a successful build into a failure
    let _ = write_warnings(&warnings, &mut io::stderr());
    println!("Module written to: {}", output.display());
    Ok(ExitCode::SUCCESS)
}

fn deps_command(engine: &ScriptEngine, script: &Path) -> Result<ExitCode, EngineError> {
    let mode = engine.script_mode(script)?;
    let resolution = engine.resolve(script)?;

    println!("Script: {}", script.display());
    println!("Mode:   {mode}");
    println!("{}", "=".repeat(60));
    for (i, dep) in resolution.iter().enumerate() {
        println!("{:4} | {dep}", i + 1);
    }
    println!("{}", "=".repeat(60));
    println!("Total dependencies: {}", resolution.len());
    Ok(ExitCode::SUCCESS)
}
