//! boxproto CLI Client
//!
//! Command-line interface for issuing box protocol requests.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use boxproto::{Config, Connection, Field, ResponseMode, Tuple, TupleResponse};

/// boxproto CLI
#[derive(Parser, Debug)]
#[command(name = "boxproto-cli")]
#[command(about = "CLI for the Tarantool box binary protocol")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:33013")]
    server: String,

    /// Accept replies holding fewer tuples than they declare
    #[arg(long)]
    lenient: bool,

    /// Read/write timeout in milliseconds (0 = none)
    #[arg(long, default_value = "5000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ping the server
    Ping,

    /// Select tuples by key (one key part per key, matched disjunctively)
    Select {
        #[arg(long, default_value = "0")]
        space: u32,
        #[arg(long, default_value = "0")]
        index: u32,
        #[arg(long, default_value = "0")]
        offset: u32,
        #[arg(long, default_value = "100")]
        limit: u32,
        /// Keys, e.g. `i32:1` or `str:Peter`
        keys: Vec<String>,
    },

    /// Insert a tuple, overwriting an existing one
    Insert {
        #[arg(long, default_value = "0")]
        space: u32,
        fields: Vec<String>,
    },

    /// Insert a tuple; fails if the key exists
    Add {
        #[arg(long, default_value = "0")]
        space: u32,
        fields: Vec<String>,
    },

    /// Replace a tuple; fails if the key is absent
    Replace {
        #[arg(long, default_value = "0")]
        space: u32,
        fields: Vec<String>,
    },

    /// Delete a tuple by primary key
    Del {
        #[arg(long, default_value = "0")]
        space: u32,
        key: Vec<String>,
    },

    /// Call a stored procedure
    Call {
        proc_name: String,
        args: Vec<String>,
    },
}

/// A field given on the command line
enum Literal {
    Int32(i32),
    Int8(i8),
    Int64(i64),
    Str(String),
}

impl Literal {
    fn parse(text: &str) -> Result<Self, String> {
        let parsed = match text.split_once(':') {
            Some(("i32", v)) => v.parse().map(Literal::Int32).map_err(|e| e.to_string()),
            Some(("i8", v)) => v.parse().map(Literal::Int8).map_err(|e| e.to_string()),
            Some(("i64", v)) => v.parse().map(Literal::Int64).map_err(|e| e.to_string()),
            Some(("str", v)) => Ok(Literal::Str(v.to_string())),
            _ => Ok(Literal::Str(text.to_string())),
        };
        parsed.map_err(|e| format!("invalid field `{}`: {}", text, e))
    }

    fn as_field(&self) -> &dyn Field {
        match self {
            Literal::Int32(v) => v as &dyn Field,
            Literal::Int8(v) => v as &dyn Field,
            Literal::Int64(v) => v as &dyn Field,
            Literal::Str(v) => v as &dyn Field,
        }
    }
}

fn parse_all(texts: &[String]) -> Result<Vec<Literal>, String> {
    texts.iter().map(|t| Literal::parse(t)).collect()
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,boxproto=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), String> {
    let mode = if args.lenient {
        ResponseMode::Lenient
    } else {
        ResponseMode::Strict
    };

    let config = Config::builder()
        .addr(&args.server)
        .read_timeout_ms(args.timeout_ms)
        .write_timeout_ms(args.timeout_ms)
        .response_mode(mode)
        .build();

    let conn = Connection::connect(&config).map_err(|e| e.to_string())?;
    tracing::debug!("boxproto CLI v{} connected to {}", boxproto::VERSION, args.server);

    let response = match args.command {
        Commands::Ping => conn.ping(),
        Commands::Select { space, index, offset, limit, keys } => {
            let literals = parse_all(&keys)?;
            let parts: Vec<[&dyn Field; 1]> = literals.iter().map(|l| [l.as_field()]).collect();
            let keys: Vec<&[&dyn Field]> = parts.iter().map(|p| &p[..]).collect();
            conn.space(space).select(index, offset, limit, &keys)
        }
        Commands::Insert { space, fields } => {
            let literals = parse_all(&fields)?;
            let tuple = fields_of(&literals);
            conn.space(space).insert(&tuple, true)
        }
        Commands::Add { space, fields } => {
            let literals = parse_all(&fields)?;
            let tuple = fields_of(&literals);
            conn.space(space).add(&tuple, true)
        }
        Commands::Replace { space, fields } => {
            let literals = parse_all(&fields)?;
            let tuple = fields_of(&literals);
            conn.space(space).replace(&tuple, true)
        }
        Commands::Del { space, key } => {
            let literals = parse_all(&key)?;
            let tuple = fields_of(&literals);
            conn.space(space).delete(&tuple, true)
        }
        Commands::Call { proc_name, args } => {
            let literals = parse_all(&args)?;
            let call_args = fields_of(&literals);
            conn.call(&proc_name, &call_args, true)
        }
    };

    print_response(&response.map_err(|e| e.to_string())?);
    Ok(())
}

fn fields_of(literals: &[Literal]) -> Vec<&dyn Field> {
    literals.iter().map(Literal::as_field).collect()
}

fn print_response(response: &TupleResponse) {
    println!("{} tuple(s)", response.count);
    for tuple in &response.tuples {
        println!("{}", format_tuple(tuple));
    }
}

/// Printable fields as text, everything else as hex
fn format_tuple(tuple: &Tuple) -> String {
    let parts: Vec<String> = tuple
        .fields
        .iter()
        .map(|field| match std::str::from_utf8(field) {
            Ok(text) if !text.is_empty() && text.chars().all(|c| !c.is_control()) => {
                format!("{:?}", text)
            }
            _ => field.iter().map(|b| format!("{:02x}", b)).collect::<String>(),
        })
        .collect();
    format!("[{}]", parts.join(", "))
}
