//! Schema command-line interface

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use octofhir_schema::ast::AllowSigns;
use octofhir_schema::cli::output::{self, OutputFormat};
use octofhir_schema::cli::{check, filter, repl, validate};
use octofhir_schema::{CodecOptions, Direction};
use std::path::PathBuf;

/// Schema command-line tool
#[derive(Parser)]
#[command(name = "schema")]
#[command(author, version, about = "Type documents, codecs and filter expressions", long_about = None)]
struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (json, pretty, table, text)
    #[arg(short = 'f', long, global = true)]
    format: Option<String>,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    color: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Signs {
    Never,
    First,
    Each,
}

impl From<Signs> for AllowSigns {
    fn from(signs: Signs) -> Self {
        match signs {
            Signs::Never => AllowSigns::Never,
            Signs::First => AllowSigns::First,
            Signs::Each => AllowSigns::Each,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build type documents and list their types
    Check {
        /// Document files; later ones may reference earlier ones
        files: Vec<PathBuf>,

        /// Include inline types
        #[arg(short, long)]
        embedded: bool,
    },

    /// Decode (or encode) a JSON value with a generated codec
    Validate {
        /// Document files; the type is looked up in the last one
        #[arg(short, long = "document", required = true)]
        documents: Vec<PathBuf>,

        /// Type to validate against
        #[arg(short = 't', long = "type")]
        type_name: String,

        /// JSON input file, `-` for stdin
        input: PathBuf,

        /// Encode instead of decode
        #[arg(short, long)]
        encode: bool,

        /// Treat every field as optional
        #[arg(short, long)]
        partial: bool,

        /// Fields to omit (comma separated, dotted paths allowed)
        #[arg(long, value_delimiter = ',')]
        omit: Vec<String>,

        /// Encode projection (`name`, `-name`, `+name`)
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        projection: Vec<String>,

        /// Skip readonly fields on decode
        #[arg(long)]
        ignore_readonly: bool,

        /// Skip writeonly fields on encode
        #[arg(long)]
        ignore_writeonly: bool,
    },

    /// Parse a filter expression
    Filter {
        /// Filter text
        text: String,

        /// Print the AST and referenced fields as JSON
        #[arg(long)]
        json: bool,

        /// Parse a sortable field path instead, with the given sign policy
        #[arg(long, value_enum)]
        path: Option<Signs>,
    },

    /// Start interactive filter REPL
    Repl,
}

fn main() {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    output::setup_colors(&cli.color);

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli) {
        eprintln!("{}", output::format_error(&e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let format = cli.format.as_deref();
    match cli.command {
        Commands::Check { files, embedded } => check::check(check::CheckConfig {
            files,
            embedded,
            format: OutputFormat::parse(format, OutputFormat::Table),
        }),

        Commands::Validate {
            documents,
            type_name,
            input,
            encode,
            partial,
            omit,
            projection,
            ignore_readonly,
            ignore_writeonly,
        } => {
            let mut options = CodecOptions::new().with_omit(omit).with_projection(projection);
            options.partial = partial;
            options.ignore_readonly_fields = ignore_readonly;
            options.ignore_writeonly_fields = ignore_writeonly;
            validate::validate(validate::ValidateConfig {
                documents,
                type_name,
                input,
                direction: if encode { Direction::Encode } else { Direction::Decode },
                options,
                format: OutputFormat::parse(format, OutputFormat::JsonPretty),
            })
        }

        Commands::Filter { text, json, path } => {
            let default = if json { OutputFormat::JsonPretty } else { OutputFormat::Text };
            filter::filter(filter::FilterConfig {
                text,
                path: path.map(AllowSigns::from),
                format: if json { default } else { OutputFormat::parse(format, default) },
            })
        }

        Commands::Repl => repl::run(),
    }
}
