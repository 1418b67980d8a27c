//! Patient → postal code → location → weather enrichment.
//!
//! Every run is tagged with a generation taken when it is triggered. All writes
//! to the observable state compare that tag against the stored one under the
//! channel lock, so a run that has been overtaken by a newer trigger can never
//! publish.

use std::sync::Arc;

use tokio::{sync::watch, task::JoinHandle};

use crate::{
    address::extract_postal_code,
    error::ProviderError,
    forecast::forecast_title,
    model::{GeoLocation, Patient, PatientRef, WeatherOverview},
    provider::{GeocodeResolver, WeatherFetcher},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    ExtractingAddress,
    ResolvingLocation,
    ResolvingWeather,
    Published,
}

/// What the patient page observes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastState {
    /// Tag of the run that owns this state; 0 before the first trigger.
    pub generation: u64,
    pub patient: Option<PatientRef>,
    pub phase: RunPhase,
    pub location: Option<GeoLocation>,
    pub weather: Option<WeatherOverview>,
}

impl ForecastState {
    pub fn title(&self) -> String {
        forecast_title(self.location.as_ref(), self.weather.as_ref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    MissingPostalCode,
    LocationUnavailable,
    WeatherUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Published,
    Stopped(StopReason),
    /// A newer trigger took over before this run could write.
    Superseded,
}

#[derive(Debug, Clone)]
pub struct EnrichmentOrchestrator {
    geocoder: Arc<dyn GeocodeResolver>,
    weather: Arc<dyn WeatherFetcher>,
    state: Arc<watch::Sender<ForecastState>>,
}

impl EnrichmentOrchestrator {
    pub fn new(geocoder: Arc<dyn GeocodeResolver>, weather: Arc<dyn WeatherFetcher>) -> Self {
        let (state, _) = watch::channel(ForecastState::default());

        Self {
            geocoder,
            weather,
            state: Arc::new(state),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ForecastState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ForecastState {
        self.state.borrow().clone()
    }

    /// Start a run if the patient identity differs from the one currently shown.
    ///
    /// `None` means the patient is still loading. Patients without an `id` all
    /// share the `Patient/` reference, so switching between two of them is not
    /// seen as a change; use [`Self::trigger`] for those. Must be called from
    /// within a tokio runtime.
    pub fn observe(&self, patient: Option<Patient>) -> Option<JoinHandle<RunOutcome>> {
        let identity = patient.as_ref().map(Patient::reference);
        let mut started = None;

        self.state.send_if_modified(|state| {
            if state.generation > 0 && state.patient == identity {
                return false;
            }
            started = Some(begin_run(state, identity.clone()));
            true
        });

        started.map(|generation| self.spawn_run(generation, patient))
    }

    /// Start a run unconditionally, even for the identity already shown.
    pub fn trigger(&self, patient: Option<Patient>) -> JoinHandle<RunOutcome> {
        let identity = patient.as_ref().map(Patient::reference);
        let mut generation = 0;

        self.state.send_modify(|state| {
            generation = begin_run(state, identity);
        });

        self.spawn_run(generation, patient)
    }

    fn spawn_run(&self, generation: u64, patient: Option<Patient>) -> JoinHandle<RunOutcome> {
        let this = self.clone();
        tokio::spawn(async move { this.run(generation, patient).await })
    }

    async fn run(&self, generation: u64, patient: Option<Patient>) -> RunOutcome {
        let Some(postal_code) = extract_postal_code(patient.as_ref()) else {
            tracing::debug!("Run {generation}: patient has no postal code");
            return self.stop(generation, StopReason::MissingPostalCode);
        };

        if !self.enter(generation, RunPhase::ResolvingLocation) {
            return RunOutcome::Superseded;
        }

        let location = match self.geocoder.resolve_location(&postal_code).await {
            Ok(location) => location,
            Err(e) => {
                tracing::debug!("Run {generation}: geocoding {postal_code} failed: {e}");
                return self.stop(generation, StopReason::LocationUnavailable);
            }
        };

        if !self.enter(generation, RunPhase::ResolvingWeather) {
            tracing::debug!("Run {generation}: superseded before weather lookup");
            return RunOutcome::Superseded;
        }

        // Coordinates come from this run's geocode result, never from stored state.
        let lookup = self.weather.resolve_weather_overview(&location).await;
        let weather = match lookup {
            Ok(weather) => weather,
            Err(e) => {
                match &e {
                    ProviderError::Status { status_text, .. } => {
                        tracing::warn!("Run {generation}: weather overview failed: {status_text}")
                    }
                    other => tracing::warn!("Run {generation}: weather overview failed: {other}"),
                }
                // The location resolved by this run is still shown without weather.
                let kept = self.write_if_current(generation, |state| {
                    state.phase = RunPhase::Idle;
                    state.location = Some(location);
                });
                return if kept {
                    RunOutcome::Stopped(StopReason::WeatherUnavailable)
                } else {
                    RunOutcome::Superseded
                };
            }
        };

        let published = self.write_if_current(generation, |state| {
            state.phase = RunPhase::Published;
            state.location = Some(location);
            state.weather = Some(weather);
        });

        if published {
            tracing::info!("Run {generation}: published forecast for {postal_code}");
            RunOutcome::Published
        } else {
            tracing::debug!("Run {generation}: superseded, discarding forecast");
            RunOutcome::Superseded
        }
    }

    fn enter(&self, generation: u64, phase: RunPhase) -> bool {
        self.write_if_current(generation, |state| state.phase = phase)
    }

    fn stop(&self, generation: u64, reason: StopReason) -> RunOutcome {
        if self.write_if_current(generation, |state| state.phase = RunPhase::Idle) {
            RunOutcome::Stopped(reason)
        } else {
            RunOutcome::Superseded
        }
    }

    fn write_if_current(&self, generation: u64, write: impl FnOnce(&mut ForecastState)) -> bool {
        self.state.send_if_modified(|state| {
            if state.generation != generation {
                return false;
            }
            write(state);
            true
        })
    }
}

/// Clear derived values for a new identity and hand out its generation.
fn begin_run(state: &mut ForecastState, identity: Option<PatientRef>) -> u64 {
    state.generation += 1;
    state.patient = identity;
    state.phase = RunPhase::ExtractingAddress;
    state.location = None;
    state.weather = None;
    state.generation
}
