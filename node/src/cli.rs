//! # CLI Interface
//!
//! Command-line structure for `claimseal-node`, via `clap` derive. Every
//! option that configures the key store can also come from a `CLAIMSEAL_*`
//! environment variable.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use claimseal_protocol::config::{
    KeyStoreConfig, DEFAULT_KEY_ALGORITHM, DEFAULT_KEY_DIR, DEFAULT_KEY_SIZE_BITS,
};

/// Claim token issuer and verifier.
///
/// Signs JSON claims with a persisted RSA key pair and checks tokens issued
/// under it, either over HTTP (`serve`) or one-shot from the command line.
#[derive(Parser, Debug)]
#[command(
    name = "claimseal-node",
    about = "Claim token issuer and verifier",
    version,
    propagate_version = true
)]
pub struct ClaimsealCli {
    /// Log output format: `pretty` or `json`.
    #[arg(long, global = true, env = "CLAIMSEAL_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the HTTP API and the metrics endpoint.
    Serve(ServeArgs),
    /// Load or generate the key pair and print where it lives.
    Init(InitArgs),
    /// Issue a request message for a claim read from a file or stdin.
    Issue(IssueArgs),
    /// Verify a request message read from a file or stdin.
    Verify(VerifyArgs),
    /// Print version information and exit.
    Version,
}

/// Key store options shared by every subcommand that touches keys.
#[derive(Args, Debug, Clone)]
pub struct KeyArgs {
    /// Directory holding `public.pem` and `private.pem`.
    ///
    /// Created with a fresh key pair on first use.
    #[arg(long, short = 'k', env = "CLAIMSEAL_KEY_DIR", default_value = DEFAULT_KEY_DIR)]
    pub key_dir: PathBuf,

    /// Key algorithm used when a new pair has to be generated.
    #[arg(long, env = "CLAIMSEAL_KEY_ALGORITHM", default_value = DEFAULT_KEY_ALGORITHM)]
    pub key_algorithm: String,

    /// Modulus size in bits used when a new pair has to be generated.
    #[arg(long, env = "CLAIMSEAL_KEY_SIZE", default_value_t = DEFAULT_KEY_SIZE_BITS)]
    pub key_size: usize,
}

impl KeyArgs {
    /// The key store configuration these options describe.
    pub fn to_config(&self) -> KeyStoreConfig {
        KeyStoreConfig::new(&self.key_dir)
            .with_algorithm(&self.key_algorithm)
            .with_key_size(self.key_size)
    }
}

/// Arguments for the `serve` subcommand.
#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub keys: KeyArgs,

    /// Address to bind both listeners to.
    #[arg(long, env = "CLAIMSEAL_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    /// Port for the HTTP API.
    #[arg(long, short = 'p', env = "CLAIMSEAL_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "CLAIMSEAL_METRICS_PORT", default_value_t = 9090)]
    pub metrics_port: u16,
}

/// Arguments for the `init` subcommand.
#[derive(Args, Debug)]
pub struct InitArgs {
    #[command(flatten)]
    pub keys: KeyArgs,
}

/// Arguments for the `issue` subcommand.
#[derive(Args, Debug)]
pub struct IssueArgs {
    #[command(flatten)]
    pub keys: KeyArgs,

    /// File containing the claim JSON. Reads stdin when omitted.
    #[arg(long)]
    pub claim: Option<PathBuf>,
}

/// Arguments for the `verify` subcommand.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub keys: KeyArgs,

    /// File containing the request message JSON. Reads stdin when omitted.
    #[arg(long)]
    pub request: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        ClaimsealCli::command().debug_assert();
    }

    #[test]
    fn test_serve_defaults() {
        let cli = ClaimsealCli::try_parse_from(["claimseal-node", "serve"]).unwrap();
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.port, 8080);
        assert_eq!(args.metrics_port, 9090);
        let config = args.keys.to_config();
        assert_eq!(config.path, PathBuf::from("keys"));
        assert_eq!(config.algorithm, "RSA");
        assert_eq!(config.key_size_bits, 2048);
    }

    #[test]
    fn test_key_args_override() {
        let cli = ClaimsealCli::try_parse_from([
            "claimseal-node",
            "issue",
            "--key-dir",
            "/tmp/k",
            "--key-size",
            "3072",
            "--claim",
            "claim.json",
        ])
        .unwrap();
        let Commands::Issue(args) = cli.command else {
            panic!("expected issue");
        };
        assert_eq!(args.claim, Some(PathBuf::from("claim.json")));
        assert_eq!(args.keys.to_config().key_size_bits, 3072);
        assert_eq!(args.keys.to_config().path, PathBuf::from("/tmp/k"));
    }

    #[test]
    fn test_log_format_is_global() {
        let cli =
            ClaimsealCli::try_parse_from(["claimseal-node", "verify", "--log-format", "json"])
                .unwrap();
        assert_eq!(cli.log_format, "json");
    }
}
