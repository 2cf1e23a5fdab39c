use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Switchyard provider routing engine
#[derive(Debug, Parser)]
#[command(name = "switchyard", about = "Provider health monitoring and weighted fallback routing")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "switchyard.toml", env = "SWITCHYARD_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "SWITCHYARD_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Log filter directive, e.g. `info` or `switchyard_health=debug`
    #[arg(long, default_value = "info", env = "SWITCHYARD_LOG")]
    pub log: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["switchyard"]).unwrap();
        assert_eq!(args.config, PathBuf::from("switchyard.toml"));
        assert!(args.listen.is_none());
        assert_eq!(args.log, "info");
    }

    #[test]
    fn listen_override() {
        let args = Args::try_parse_from(["switchyard", "--listen", "127.0.0.1:8080", "-c", "routes.toml"]).unwrap();
        assert_eq!(args.listen, Some(SocketAddr::from(([127, 0, 0, 1], 8080))));
        assert_eq!(args.config, PathBuf::from("routes.toml"));
    }
}
