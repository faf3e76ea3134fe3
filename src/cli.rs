use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "sipni",
    version,
    about = "Look up citizen and vaccination calendar records in SI-PNI",
    after_help = "Credentials are read from SIPNI_LOGIN and SIPNI_PASSWORD (a .env file in the current directory is loaded first)."
)]
pub struct Cli {
    /// Citizen identifiers (CPF) to look up
    #[arg(required = true, value_name = "CPF")]
    pub documents: Vec<String>,

    /// Keep using the first access token even after it expires
    #[arg(long)]
    pub no_auto_refresh: bool,

    /// Print each result as a single line of JSON
    #[arg(long)]
    pub compact: bool,

    /// Use a specific API base URL instead of the production service (overrides SIPNI_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Enable verbose output for debugging API calls and token refreshes
    #[arg(long, short = 'v')]
    pub verbose: bool,
}
