mod enrich;
mod sheets;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "coenrich")]
#[command(about = "Fill spreadsheet rows with company identifier, location and profile URL")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Bearer token for the spreadsheet and file-listing APIs.
#[derive(Debug, Args)]
struct AuthArgs {
    #[arg(long, env = "COENRICH_ACCESS_TOKEN", hide_env_values = true)]
    access_token: String,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Enrich every incomplete row of a sheet and write the results back
    Enrich {
        /// Spreadsheet id from the sheet URL
        #[arg(long)]
        spreadsheet_id: String,
        /// Sheet (tab) title
        #[arg(long)]
        sheet: String,
        /// Header of the column holding company names
        #[arg(long)]
        column: String,
        /// Override the delay between enriched rows, in milliseconds
        #[arg(long)]
        pacing_ms: Option<u64>,
        /// Skip loading the proxy list before starting
        #[arg(long)]
        no_proxy_refresh: bool,
        #[command(flatten)]
        auth: AuthArgs,
    },
    /// Enrich a single company name and print the result as JSON
    Lookup {
        company: String,
        /// Skip loading the proxy list before starting
        #[arg(long)]
        no_proxy_refresh: bool,
    },
    /// List spreadsheets visible to the access token
    Spreadsheets {
        #[command(flatten)]
        auth: AuthArgs,
    },
    /// Show every sheet of a spreadsheet with its header row
    Details {
        spreadsheet_id: String,
        #[command(flatten)]
        auth: AuthArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = coenrich_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    // stdout carries command output only.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Enrich {
            spreadsheet_id,
            sheet,
            column,
            pacing_ms,
            no_proxy_refresh,
            auth,
        } => {
            let args = enrich::EnrichArgs {
                spreadsheet_id,
                sheet,
                column,
                pacing_ms,
                refresh_proxies: !no_proxy_refresh,
                access_token: auth.access_token,
            };
            enrich::run_enrich(&config, args).await?;
        }
        Commands::Lookup {
            company,
            no_proxy_refresh,
        } => enrich::run_lookup(&config, &company, !no_proxy_refresh).await?,
        Commands::Spreadsheets { auth } => {
            sheets::run_list_spreadsheets(&config, &auth.access_token).await?;
        }
        Commands::Details {
            spreadsheet_id,
            auth,
        } => sheets::run_sheet_details(&config, &auth.access_token, &spreadsheet_id).await?,
    }

    Ok(())
}
