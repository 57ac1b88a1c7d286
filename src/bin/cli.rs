//! GateKV CLI Client
//!
//! Command-line interface for interacting with GateKV. Every invocation
//! opens one connection, sends one request and prints one reply.

use clap::{Parser, Subcommand};
use gatekv::protocol::{encode_command, Command};
use gatekv::{Reply, TcpClient, READ_TIMEOUT};
use tracing_subscriber::{fmt, EnvFilter};

/// GateKV CLI
#[derive(Parser, Debug)]
#[command(name = "gatekv-cli")]
#[command(about = "CLI for the GateKV key-value server")]
struct Args {
    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value = "7878")]
    port: u16,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Ping the server
    Ping,

    /// Send a raw request line as-is
    Raw {
        /// The request line
        line: String,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();
    let client = TcpClient::new(args.host, args.port);

    let request = match args.command {
        Commands::Get { key } => encode_command(&Command::get(key)),
        Commands::Put { key, value } => encode_command(&Command::put(key, value)),
        Commands::Del { key } => encode_command(&Command::delete(key)),
        Commands::Ping => encode_command(&Command::Ping),
        Commands::Raw { line } => Ok(line),
    };

    let request = match request {
        Ok(request) => request,
        Err(e) => {
            eprintln!("Invalid request: {}", e);
            std::process::exit(2);
        }
    };

    match client.send_request(&request) {
        Ok(Reply::Line(line)) => println!("Response: {}", line),
        Ok(Reply::TimedOut) => {
            eprintln!(
                "Timeout: {} did not reply within {} ms",
                client,
                READ_TIMEOUT.as_millis()
            );
            std::process::exit(3);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
