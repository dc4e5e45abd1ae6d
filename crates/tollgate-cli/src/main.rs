mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tollgate", version, about = "Tollgate token and session gateway")]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, env = "TOLLGATE_CONFIG", default_value = "tollgate.yaml")]
    config: PathBuf,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server.
    Serve {
        /// Override `server.bind`, e.g. 0.0.0.0:8000
        #[arg(long)]
        bind: Option<String>,
    },

    /// Issue, verify and inspect access tokens.
    Token {
        #[command(subcommand)]
        cmd: TokenCommand,
    },

    /// Signing secret management.
    Secret {
        #[command(subcommand)]
        cmd: SecretCommand,
    },

    /// Validate the configuration file.
    Check,

    /// Credential store helpers.
    Credentials {
        #[command(subcommand)]
        cmd: CredentialsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Issue a token signed with the configured secret.
    Issue {
        /// Subject username.
        #[arg(long)]
        username: String,

        /// Scope to grant (repeatable).
        #[arg(long = "scope")]
        scopes: Vec<String>,

        /// Lifetime such as "30m", "12h" or "7days". Defaults to `token.default_ttl_secs`.
        #[arg(long)]
        ttl: Option<String>,

        /// Extra claim as key=value (repeatable). Values that parse as JSON are kept typed.
        #[arg(long = "claim")]
        claims: Vec<String>,

        /// Write the token to a file instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Verify a token's signature, expiry and issuer.
    Verify {
        /// Token string or path to a file containing it.
        token: String,
    },

    /// Decode a token without checking its signature.
    Inspect {
        /// Token string or path to a file containing it.
        token: String,
    },
}

#[derive(Subcommand, Debug)]
enum SecretCommand {
    /// Generate a random signing secret.
    Generate {
        /// Write the secret to a file instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum CredentialsCommand {
    /// Hash a password for `credentials.users.<name>.password_hash`.
    Hash {
        /// Password to hash. Read from TOLLGATE_PASSWORD when omitted.
        #[arg(long, env = "TOLLGATE_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    match cli.cmd {
        Command::Serve { bind } => commands::serve::run(&cli.config, bind).await?,

        Command::Token { cmd } => match cmd {
            TokenCommand::Issue {
                username,
                scopes,
                ttl,
                claims,
                output,
            } => commands::token::issue(&cli.config, username, scopes, ttl, claims, output)?,
            TokenCommand::Verify { token } => commands::token::verify(&cli.config, token)?,
            TokenCommand::Inspect { token } => commands::token::inspect(token)?,
        },

        Command::Secret { cmd } => match cmd {
            SecretCommand::Generate { output } => commands::secret::generate(output)?,
        },

        Command::Check => {
            let results = commands::check::run(&cli.config);
            results.print_summary();
            if results.has_errors() {
                std::process::exit(1);
            }
        }

        Command::Credentials { cmd } => match cmd {
            CredentialsCommand::Hash { password } => commands::credentials::hash(&password)?,
        },
    }

    Ok(())
}
