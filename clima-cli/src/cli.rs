use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clima_core::{Config, Session, render};
use inquire::{InquireError, Text};
use tracing::{debug, info};

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "clima", version, about = "Current weather and 48-hour forecast by city")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the endpoint that provides the weather API key.
    #[arg(long, global = true)]
    pub config_url: Option<String>,

    /// Record each successful search at this `saveCity` endpoint.
    #[arg(long, global = true)]
    pub save_city_url: Option<String>,

    /// Log to stderr (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively edit the configuration file.
    Configure,

    /// Show weather for a city.
    Show {
        /// City name, optionally followed by a country code ("Sevilla, ES").
        city: String,

        /// Also write the result as an HTML page.
        #[arg(long)]
        html: Option<PathBuf>,
    },

    /// Prompt for cities until cancelled (Esc or Ctrl-C).
    Interactive,
}

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "off",
        1 => "clima_cli=info,clima_core=info",
        _ => "clima_cli=debug,clima_core=debug",
    }
}

impl Cli {
    pub async fn run(self) -> Result<ExitCode> {
        let mut config = self.load_config()?;

        if let Some(url) = &self.config_url {
            config.config_url = url.clone();
        }
        if let Some(url) = &self.save_city_url {
            config.save_city_url = Some(url.clone());
        }

        match self.command {
            Command::Configure => {
                configure(config, self.config.as_deref()).await?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Show { ref city, ref html } => show(&config, city, html.as_deref()).await,
            Command::Interactive => {
                interactive(&config).await?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }

    fn load_config(&self) -> Result<Config> {
        match &self.config {
            Some(path) => Config::load_from(path),
            None => Config::load(),
        }
    }
}

async fn show(config: &Config, city: &str, html: Option<&std::path::Path>) -> Result<ExitCode> {
    let session = Session::start(config)?;

    let outcome = session.search(city).await;
    let code = match outcome {
        Ok(result) => {
            output::print_result(&result);

            if let Some(path) = html {
                std::fs::write(path, render::report_html(&result))
                    .with_context(|| format!("Failed to write HTML report: {}", path.display()))?;
                info!(path = %path.display(), "HTML report written");
            }

            if result.error().is_some() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            output::print_notice(&err);
            ExitCode::FAILURE
        }
    };

    // The result is already on screen; let the search record finish before exiting.
    session.flush_history().await;
    Ok(code)
}

async fn interactive(config: &Config) -> Result<()> {
    // Session start plays the part of page load: the key fetch begins in the background.
    let session = Session::start(config)?;

    loop {
        let answer = tokio::task::spawn_blocking(|| Text::new("Ciudad:").prompt())
            .await
            .context("Prompt task failed")?;

        let city = match answer {
            Ok(city) => city,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                debug!("prompt cancelled");
                session.flush_history().await;
                return Ok(());
            }
            Err(err) => return Err(err).context("Failed to read city"),
        };

        match session.search(&city).await {
            Ok(result) => output::print_result(&result),
            Err(err) => output::print_notice(&err),
        }
    }
}

async fn configure(current: Config, path: Option<&std::path::Path>) -> Result<()> {
    let updated = tokio::task::spawn_blocking(move || prompt_config(current))
        .await
        .context("Configuration prompt task failed")??;

    match path {
        Some(path) => updated.save_to(path)?,
        None => updated.save()?,
    }

    let written = match path {
        Some(path) => path.to_path_buf(),
        None => Config::config_file_path()?,
    };
    println!("Configuración guardada en {}", written.display());
    Ok(())
}

fn prompt_config(current: Config) -> Result<Config> {
    let config_url = Text::new("URL del endpoint de configuración:")
        .with_default(&current.config_url)
        .prompt()?;

    let weather_base_url = Text::new("URL base de OpenWeather:")
        .with_default(&current.weather_base_url)
        .prompt()?;

    let save_city_url = Text::new("URL de saveCity (vacío para desactivar):")
        .with_initial_value(current.save_city_url.as_deref().unwrap_or_default())
        .prompt()?;

    let timeout = inquire::CustomType::<u64>::new("Tiempo máximo por petición (ms):")
        .with_default(current.request_timeout_ms)
        .prompt()?;

    let save_city_url = save_city_url.trim();

    Ok(Config {
        config_url: config_url.trim().to_string(),
        weather_base_url: weather_base_url.trim().to_string(),
        save_city_url: (!save_city_url.is_empty()).then(|| save_city_url.to_string()),
        request_timeout_ms: timeout,
        ..current
    })
}
