//! CLI argument definitions using clap derive macros.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Web front end for downloading media through yt-dlp.
///
/// Serves a single page plus a small JSON API for preparing downloads,
/// polling progress and fetching the finished files.
#[derive(Parser, Debug)]
#[command(name = "media-dl")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// JSON configuration file (defaults apply when omitted)
    #[arg(short = 'c', long, env = "MEDIA_DL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on, overriding the configuration file
    #[arg(short = 'b', long)]
    pub bind: Option<SocketAddr>,

    /// Port to listen on, keeping the configured interface
    #[arg(short = 'p', long, env = "PORT")]
    pub port: Option<u16>,
}

impl Args {
    /// Listen address after applying `--bind` and `--port` to `configured`
    ///
    /// `--bind` wins over `--port`.
    pub fn bind_address(&self, configured: SocketAddr) -> SocketAddr {
        match (self.bind, self.port) {
            (Some(bind), _) => bind,
            (None, Some(port)) => SocketAddr::new(configured.ip(), port),
            (None, None) => configured,
        }
    }

    /// Default log level implied by the verbosity flags
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }
}
