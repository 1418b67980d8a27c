use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use forecast_core::{
    Config, EnrichmentOrchestrator, ForecastState, Patient, RunOutcome, client_from_config,
};
use tokio::task::JoinHandle;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "patient-forecast", version, about = "Patient record with weather forecast")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key in the config file.
    Configure,

    /// Show a patient page with the forecast for the patient's postal code.
    Show {
        /// Path to a FHIR Patient resource (JSON).
        patient: PathBuf,

        /// Switch to another patient right after the first one, before its forecast resolves.
        #[arg(long)]
        switch_to: Option<PathBuf>,

        /// Tab to open below the forecast.
        #[arg(long, value_enum, default_value_t = PatientTab::Overview)]
        tab: PatientTab,

        /// Override the OpenWeather base URL.
        #[arg(long)]
        base_url: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PatientTab {
    Overview,
    Timeline,
    History,
}

impl PatientTab {
    const ALL: [PatientTab; 3] = [PatientTab::Overview, PatientTab::Timeline, PatientTab::History];

    fn label(self) -> &'static str {
        match self {
            PatientTab::Overview => "Overview",
            PatientTab::Timeline => "Timeline",
            PatientTab::History => "History",
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show {
                patient,
                switch_to,
                tab,
                base_url,
            } => show(&patient, switch_to.as_deref(), tab, base_url).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    config.set_api_key(api_key.trim().to_string());
    config.save()?;

    println!(
        "Saved API key to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

async fn show(
    patient_path: &Path,
    switch_to: Option<&Path>,
    tab: PatientTab,
    base_url: Option<String>,
) -> anyhow::Result<()> {
    let config = Config::load()?
        .with_env_overrides()
        .with_overrides(None, base_url);
    let client = client_from_config(&config)?;
    let orchestrator = EnrichmentOrchestrator::new(client.clone(), client);

    let mut current = load_patient(patient_path)?;
    let mut runs = Vec::new();
    runs.extend(start_run(&orchestrator, &current));

    if let Some(path) = switch_to {
        current = load_patient(path)?;
        runs.extend(start_run(&orchestrator, &current));
    }

    for run in runs {
        let outcome = run.await.context("Forecast task failed")?;
        tracing::debug!("Forecast run finished: {outcome:?}");
        if outcome == RunOutcome::Superseded {
            tracing::info!("Discarded forecast of a patient that is no longer shown");
        }
    }

    print!("{}", render_page(&current, &orchestrator.snapshot(), tab));
    Ok(())
}

/// Patients without an `id` share one reference, so each file gets its own run.
fn start_run(
    orchestrator: &EnrichmentOrchestrator,
    patient: &Patient,
) -> Option<JoinHandle<RunOutcome>> {
    if patient.id.is_none() {
        Some(orchestrator.trigger(Some(patient.clone())))
    } else {
        orchestrator.observe(Some(patient.clone()))
    }
}

fn load_patient(path: &Path) -> anyhow::Result<Patient> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read patient file: {}", path.display()))?;

    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse patient file: {}", path.display()))
}

fn render_page(patient: &Patient, state: &ForecastState, tab: PatientTab) -> String {
    let heading = patient
        .display_name()
        .unwrap_or_else(|| patient.reference().to_string());

    let mut out = format!("{heading}\n{}\n", state.title());

    if let Some(date) = state.weather.as_ref().and_then(|w| w.date) {
        out.push_str(&format!("Overview for {}\n", date.format("%A, %B %-d, %Y")));
    }

    let tabs: Vec<String> = PatientTab::ALL
        .iter()
        .map(|t| {
            if *t == tab {
                format!("[{}]", t.label())
            } else {
                t.label().to_string()
            }
        })
        .collect();
    out.push_str(&tabs.join(" | "));
    out.push('\n');

    out
}
