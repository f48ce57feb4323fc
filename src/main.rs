//! hxmacro - evaluate Haxe-style compile-time expression macros
//!
//! # Usage
//!
//! ```bash
//! # List the builtin macros
//! hxmacro list
//!
//! # Invoke one macro at a call site and print the expression it produces
//! hxmacro invoke makeArray --args '[3]' --file Main.hx --line 4 --column 13
//!
//! # Conditional compilation flags and JSON output
//! hxmacro invoke ifDefined --args '["debug", 1, 2]' -D debug --format json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use compiler::config::{self, MacroConfig};
use compiler::logging;
use compiler::macro_system::{
    make_expr, register_builtins, CompilationContext, Expr, Literal, MacroError, MacroRegistry,
    Position,
};
use diagnostics::{Diagnostic, Diagnostics, ErrorFormatter};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "hxmacro")]
#[command(version = "0.1.0")]
#[command(about = "Evaluate Haxe-style compile-time expression macros", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered macros and their arities
    List,

    /// Invoke a macro and print the expression that replaces its call site
    Invoke {
        /// Macro name
        name: String,

        /// Arguments as a JSON array of plain values
        #[arg(long, default_value = "[]")]
        args: String,

        /// File name reported for the call site. If it names a readable file,
        /// its text is used for source snippets in diagnostics.
        #[arg(long, default_value = "Main.hx")]
        file: String,

        /// Call-site line (1-based)
        #[arg(long, default_value = "1")]
        line: usize,

        /// Call-site column (1-based)
        #[arg(long, default_value = "1")]
        column: usize,

        /// Conditional compilation flag, `name` or `name=value`
        #[arg(short = 'D', long = "define", value_name = "NAME[=VALUE]")]
        defines: Vec<String>,

        /// Maximum nesting of macro invocations
        #[arg(long)]
        max_depth: Option<usize>,

        /// Configuration file
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::List => {
            logging::init_from_env();
            list_macros()
        }
        Commands::Invoke {
            name,
            args,
            file,
            line,
            column,
            defines,
            max_depth,
            config,
            format,
        } => invoke_macro(InvokeOptions {
            name,
            args,
            file,
            line,
            column,
            defines,
            max_depth,
            config,
            format,
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn builtin_registry() -> Result<MacroRegistry, String> {
    let mut registry = MacroRegistry::new();
    register_builtins(&mut registry).map_err(|e| e.to_string())?;
    Ok(registry)
}

fn list_macros() -> Result<(), String> {
    let registry = builtin_registry()?;
    for definition in registry.definitions() {
        println!(
            "{:<12} {:<12} {}",
            definition.name(),
            format!("({})", definition.arity()),
            definition.doc().unwrap_or("")
        );
    }
    Ok(())
}

struct InvokeOptions {
    name: String,
    args: String,
    file: String,
    line: usize,
    column: usize,
    defines: Vec<String>,
    max_depth: Option<usize>,
    config: Option<PathBuf>,
    format: OutputFormat,
}

fn parse_define(raw: &str) -> Result<(String, String), String> {
    let (name, value) = match raw.split_once('=') {
        Some((name, value)) => (name.trim(), value.trim()),
        None => (raw.trim(), "1"),
    };
    if name.is_empty() {
        return Err(format!("invalid define '{}'", raw));
    }
    Ok((name.to_string(), value.to_string()))
}

fn parse_args(json: &str, call_site: Position) -> Result<Vec<Expr>, String> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| format!("--args is not valid JSON: {}", e))?;
    match value {
        serde_json::Value::Array(items) => Ok(items
            .into_iter()
            .map(|item| make_expr(&Literal::from(item), call_site))
            .collect()),
        _ => Err("--args must be a JSON array".to_string()),
    }
}

fn invoke_macro(opts: InvokeOptions) -> Result<(), String> {
    let config = match &opts.config {
        Some(path) => config::load_config(path)?,
        None => MacroConfig::default(),
    };
    logging::init_from_env_or(config.log_level);
    log::debug!("configuration: {:?}", config);

    let registry = builtin_registry()?;
    let mut ctx = CompilationContext::new();
    config.apply(&mut ctx);
    for raw in &opts.defines {
        let (name, value) = parse_define(raw)?;
        ctx.define(name, value);
    }
    if let Some(max_depth) = opts.max_depth {
        ctx.set_max_depth(max_depth);
    }
    ctx.begin_pass();
    for (name, value) in ctx.defines() {
        log::debug!("define {}={}", name, value);
    }

    // the call-site file does not have to exist; snippets are skipped when it doesn't
    let source = std::fs::read_to_string(&opts.file).unwrap_or_default();
    let file_id = ctx.add_file(opts.file.clone(), source);
    let call_site = Position::synthetic(file_id, opts.line, opts.column);
    let args = parse_args(&opts.args, call_site)?;
    log::debug!("invoking '{}' at {} with {} argument(s)", opts.name, call_site, args.len());

    let result = registry.invoke(&mut ctx, &opts.name, &args, call_site);

    let collected = ctx.take_diagnostics();
    if !collected.is_empty() {
        report_all(&collected, &ctx, opts.format);
    }

    match result {
        Ok(expr) => {
            match opts.format {
                OutputFormat::Text => println!("{}", expr),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&expr).map_err(|e| e.to_string())?
                ),
            }
            Ok(())
        }
        Err(err) => {
            let diagnostic = ctx.error_diagnostic(&err);
            report(&diagnostic, &ctx, opts.format);
            Err(summary(&err))
        }
    }
}

fn formatter() -> ErrorFormatter {
    if std::io::stderr().is_terminal() {
        ErrorFormatter::with_colors()
    } else {
        ErrorFormatter::new()
    }
}

fn json_diagnostic(diagnostic: &Diagnostic, ctx: &CompilationContext) -> serde_json::Value {
    let location = diagnostic.span.map(|span| ctx.source_map().describe(&span));
    serde_json::json!({
        "severity": diagnostic.severity.to_string(),
        "code": diagnostic.code,
        "message": diagnostic.message,
        "location": location,
        "notes": diagnostic.notes,
        "help": diagnostic.help,
    })
}

fn report(diagnostic: &Diagnostic, ctx: &CompilationContext, format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            eprint!("{}", formatter().format_diagnostic(diagnostic, ctx.source_map()));
        }
        OutputFormat::Json => eprintln!("{}", json_diagnostic(diagnostic, ctx)),
    }
}

fn report_all(diagnostics: &Diagnostics, ctx: &CompilationContext, format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            eprintln!("{}", formatter().format_diagnostics(diagnostics, ctx.source_map()));
        }
        OutputFormat::Json => {
            for diagnostic in diagnostics.iter() {
                eprintln!("{}", json_diagnostic(diagnostic, ctx));
            }
        }
    }
}

fn summary(err: &MacroError) -> String {
    format!("macro evaluation failed [{}]", err.error_code())
}
