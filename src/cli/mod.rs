// CLI module

use clap::Parser;

/// luach - personal dashboard server for Gmail, Calendar, weather, news
/// and Hebrew-calendar data
#[derive(Parser, Debug)]
#[command(name = "luach", version, about, long_about = None)]
pub struct Args {
    /// Run the OAuth consent flow for a Google account, then start the server
    #[arg(long)]
    pub login: bool,

    /// Record the authorized account under this label (personal or business)
    #[arg(long, requires = "login")]
    pub label: Option<String>,
}
