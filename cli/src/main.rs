/*
    playlist-analyzer | Fetch and present Spotify playlist analyses.
    Copyright (C) 2025  Israel Alberto Roldan Vega

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use analyzer_core::navigation::ANALYSIS_QUERY_PARAM;
use analyzer_core::{
    login_url_from_env, AnalysisResult, AppConfig, HttpAnalysisService, NavigationContext,
    PageNavigation, RetrievalState, Session, Url,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use log::debug;
use std::env;
use std::fs::File;
use std::io::Write;
use std::process;
use std::sync::Arc;

const DEFAULT_ORIGIN: &str = "http://localhost:5173/";
const BAR_WIDTH: u32 = 30;

#[derive(Parser)]
#[command(name = "playlist-analyzer")]
#[command(about = "Fetch and read analyses of your Spotify playlists", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prints the Spotify login URL. After authorizing, pass the address you land on to --page.
    Login,
    /// Analyzes a playlist given its URL or ID
    Analyze {
        /// Spotify playlist URL or ID
        #[arg(value_name = "PLAYLIST")]
        playlist: String,

        /// Page address to start from, e.g. the redirect URL carrying #access_token=...
        #[arg(long)]
        page: Option<String>,

        /// Output the analysis to a JSON file (e.g., --json=analysis.json)
        #[arg(long)]
        json: Option<String>,
    },
    /// Opens a shared analysis link (an address with ?analysis=<id>)
    Open {
        #[arg(value_name = "PAGE_URL")]
        page: String,

        /// Output the analysis to a JSON file
        #[arg(long)]
        json: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if dotenv().is_err() {
        // Silently ignore
    }

    let cli = Cli::parse();

    match &cli.command {
        Commands::Login => {
            handle_login();
        }
        Commands::Analyze {
            playlist,
            page,
            json,
        } => {
            handle_analyze(playlist, page.as_deref(), json.as_deref()).await;
        }
        Commands::Open { page, json } => {
            handle_open(page, json.as_deref()).await;
        }
    }
}

fn default_page() -> String {
    env::var("ANALYZER_ORIGIN").unwrap_or_else(|_| DEFAULT_ORIGIN.to_string())
}

fn start_session(page: &str) -> anyhow::Result<(Session, Arc<PageNavigation>)> {
    let url = Url::parse(page).with_context(|| format!("Invalid page URL '{}'", page))?;
    let config = AppConfig::from_env(&url)?;
    debug!("Using analysis service at {} ({:?})", config.api_base, config.mode);

    let service = HttpAnalysisService::new(config.api_base.clone(), config.request_timeout)
        .context("Failed to build HTTP client")?;
    let navigation = Arc::new(PageNavigation::new(url));
    let session = Session::new(&config, navigation.clone(), Arc::new(service));

    Ok((session, navigation))
}

fn get_session(page: &str) -> (Session, Arc<PageNavigation>) {
    match start_session(page) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error starting session: {:#}", e);
            process::exit(1);
        }
    }
}

fn handle_login() {
    match login_url_from_env() {
        Ok(url) => {
            println!("Open this URL in your browser and authorize the app:");
            println!();
            println!("  {}", url);
            println!();
            println!("You will be redirected to an address ending in #access_token=...");
            println!("Pass that whole address to 'playlist-analyzer analyze <PLAYLIST> --page <URL>'.");
        }
        Err(e) => {
            eprintln!("Login unavailable: {}", e);
            process::exit(1);
        }
    }
}

async fn handle_analyze(playlist: &str, page: Option<&str>, json_path: Option<&str>) {
    let page = page.map(str::to_string).unwrap_or_else(default_page);
    let (session, navigation) = get_session(&page);

    if !session.is_authenticated() {
        println!("[INFO] No access token in the page address. Run 'playlist-analyzer login' first.");
    }

    println!("Fetching analysis for: {} ...", playlist);
    session.submit_input(playlist).await;

    report(&session.state(), &navigation, json_path);
}

async fn handle_open(page: &str, json_path: Option<&str>) {
    let (session, navigation) = get_session(page);

    if session.restore_deep_link().await.is_none() {
        eprintln!("[ERROR] No '?analysis=<id>' found in {}", page);
        process::exit(1);
    }

    report(&session.state(), &navigation, json_path);
}

fn report(state: &RetrievalState, navigation: &PageNavigation, json_path: Option<&str>) {
    match state {
        RetrievalState::Succeeded(result) => {
            print_analysis(result);

            if navigation.read_query(ANALYSIS_QUERY_PARAM).is_some() {
                println!();
                println!("[SHARE] {}", navigation.current());
            }

            if let Some(path) = json_path {
                match save_json(result, path) {
                    Ok(()) => {
                        println!();
                        println!("[SAVED] Analysis saved to: {}", path);
                    }
                    Err(e) => {
                        eprintln!();
                        eprintln!("[ERROR] {:#}", e);
                    }
                }
            }
        }
        RetrievalState::Failed(message) => {
            eprintln!();
            eprintln!("[ERROR] {}", message);
            process::exit(1);
        }
        RetrievalState::Idle | RetrievalState::Loading => {
            eprintln!("[ERROR] No analysis was fetched");
            process::exit(1);
        }
    }
}

/// Serializes first so a failure never leaves an empty file behind.
fn save_json(result: &AnalysisResult, path: &str) -> anyhow::Result<()> {
    let json_content =
        serde_json::to_string_pretty(result).context("Failed to serialize analysis")?;
    let mut file =
        File::create(path).with_context(|| format!("Failed to create file '{}'", path))?;
    file.write_all(json_content.as_bytes()).context("Failed to write analysis to file")?;
    Ok(())
}

fn print_analysis(result: &AnalysisResult) {
    println!();
    println!("---------------------------------------------------");
    println!("{}", result.playlist_name);
    println!("by {}", result.playlist_owner);
    if let Some(ts) = result.analyzed_at_local() {
        println!("analyzed on {}", ts.format("%B %-d, %Y %-I:%M %p"));
    }
    println!("---------------------------------------------------");

    println!("OVERALL");
    println!("  Total tracks:      {}", result.total_tracks);
    println!("  Average duration:  {}", result.average_duration());

    println!();
    println!("YEAR DISTRIBUTION");
    let max = result.year_distribution.values().copied().max().unwrap_or(0);
    for (year, count) in &result.year_distribution {
        let width = if max == 0 { 0 } else { (count * BAR_WIDTH).div_ceil(max) };
        println!("  {:<6} {:<30} {}", year, "#".repeat(width as usize), count);
    }

    println!();
    println!("TOP GENRES");
    for (i, genre) in result.top_genres.iter().enumerate() {
        println!("  {:>2}. {} ({})", i + 1, genre.name(), genre.count());
    }

    println!();
    println!("TOP ARTISTS");
    for (i, artist) in result.top_artists.iter().enumerate() {
        println!("  {:>2}. {} ({})", i + 1, artist.name(), artist.count());
    }

    println!();
    println!("PLAYLIST INSIGHTS");
    println!(
        "  Throwback Index:      {}% (tracks > 10 yr old)",
        result.throwback_index
    );
    println!("  Explicit Energy:      {}%", result.explicit_energy);
    println!("  Artist Concentration: {}%", result.artist_concentration);
    println!("  Freshness Score:      {}%", result.freshness_score);
    println!("  Collab Score:         {}", result.collab_score);

    println!("---------------------------------------------------");
    println!("TRACKS ({})", result.tracks.len());
    for (i, track) in result.tracks.iter().enumerate() {
        println!("{:>4}. {}", i + 1, track);
    }
}
