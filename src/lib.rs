pub mod destination;
pub mod error;
pub mod music_api;
pub mod report;
pub mod spotify;
pub mod sync;
pub mod tidal;
pub mod utils;

#[cfg(test)]
mod test_utils;

use clap::Parser;

// options shared by both service clients, flattened into the binary's arguments
#[derive(Parser, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Enable debug mode: the last raw response of each service is written
    /// to a `debug` folder
    #[arg(long, default_value = "false")]
    pub debug: bool,

    /// Proxy to use for all requests in the format http://<ip>:<port>
    #[arg(long)]
    pub proxy: Option<String>,
}
