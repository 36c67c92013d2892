use clap::Parser;

/// Launches the detection core against a named poker window.
#[derive(Debug, Parser)]
#[command(name = "pokertool", version, about)]
pub struct Args {
    /// Poker site identifier, used for the compliance matrix lookup.
    #[arg(long, default_value = "generic")]
    pub site: String,

    /// Table identifier, carried into `TableState`/`HandHistory`.
    #[arg(long, default_value = "table-1")]
    pub table: String,

    /// Path to a TOML configuration file; defaults are used if absent.
    #[arg(long)]
    pub config: Option<String>,

    /// Run a single frame against a synthetic capture and exit, for smoke
    /// testing without a real window.
    #[arg(long)]
    pub once: bool,
}
