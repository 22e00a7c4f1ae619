// src/engine.rs
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{info, warn};

use crate::classifier::TrainedModel;
use crate::config::PipelineConfig;
use crate::drivers::{
    recording_to_features, window_to_features, PipelineError, SampleSource, Window, WindowPipeline,
};
use crate::recorder::DataRecorder;
use crate::types::{PredictionEvent, RawSample, StopReason};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceState {
    WaitingForWindow,
    Classifying,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub windows: usize,
    pub reason: StopReason,
}

/// Runs the shared window pipeline against a live source and labels each window.
pub struct PredictionService {
    model: TrainedModel,
    config: PipelineConfig,
    state: ServiceState,
    classified: usize,
}

impl PredictionService {
    /// Takes ownership of the model. Fails if the model was trained on a different
    /// window shape than `config` produces.
    pub fn new(model: TrainedModel, config: PipelineConfig) -> Result<Self, PipelineError> {
        model.check_config(&config)?;
        Ok(Self {
            model,
            config,
            state: ServiceState::WaitingForWindow,
            classified: 0,
        })
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn classified(&self) -> usize {
        self.classified
    }

    pub fn model(&self) -> &TrainedModel {
        &self.model
    }

    pub fn classify_window(&mut self, window: &Window) -> Result<String, PipelineError> {
        self.state = ServiceState::Classifying;
        let result = self.model.predict(&window_to_features(window));
        self.state = ServiceState::WaitingForWindow;
        let label = result?;
        self.classified += 1;
        Ok(label)
    }

    /// Classifies a stored recording in bounded mode.
    pub fn classify_recording(
        &self,
        samples: impl IntoIterator<Item = RawSample>,
    ) -> Result<String, PipelineError> {
        self.model.predict(&recording_to_features(&self.config, samples))
    }

    /// Consumes `source` until it ends, fails, or `cancel` is raised. Labels go out on
    /// `tx` in window order. A partially filled window is dropped, never classified.
    ///
    /// Transport failures end the run normally with [`StopReason::Transport`]; a
    /// dimension mismatch or tripped malformed-line breaker is returned as an error.
    pub fn run<S: SampleSource>(
        &mut self,
        source: S,
        cancel: &AtomicBool,
        tx: &Sender<PredictionEvent>,
    ) -> Result<RunSummary, PipelineError> {
        let mut pipeline = WindowPipeline::new(source, &self.config);
        let started_with = self.classified;
        let reason = loop {
            if cancel.load(Ordering::Relaxed) {
                break StopReason::Cancelled;
            }
            match pipeline.pump_window() {
                Ok(Some(window)) => {
                    if cancel.load(Ordering::Relaxed) {
                        break StopReason::Cancelled;
                    }
                    let label = self.classify_window(&window)?;
                    info!("Predicted phrase: {label}");
                    tx.send(PredictionEvent::Label {
                        index: self.classified - started_with - 1,
                        label,
                    })
                    .ok();
                }
                Ok(None) => {
                    break if cancel.load(Ordering::Relaxed) {
                        StopReason::Cancelled
                    } else {
                        StopReason::EndOfStream
                    };
                }
                Err(e) if e.is_transport() => {
                    warn!("sample stream ended: {e}");
                    break StopReason::Transport(e.to_string());
                }
                Err(e) => return Err(e),
            }
        };
        let summary = RunSummary {
            windows: self.classified - started_with,
            reason,
        };
        info!(
            "prediction stopped after {} windows ({:?})",
            summary.windows, summary.reason
        );
        tx.send(PredictionEvent::Finished {
            windows: summary.windows,
            reason: summary.reason.clone(),
        })
        .ok();
        Ok(summary)
    }
}

/// Moves the service onto its own thread; events arrive on the returned receiver.
pub fn spawn_prediction<S>(
    mut service: PredictionService,
    source: S,
    cancel: Arc<AtomicBool>,
) -> (
    Receiver<PredictionEvent>,
    JoinHandle<Result<RunSummary, PipelineError>>,
)
where
    S: SampleSource + Send + 'static,
{
    let (tx, rx) = channel();
    let handle = thread::spawn(move || service.run(source, &cancel, &tx));
    (rx, handle)
}

/// Captures windows `start..=end` for one phrase and saves each as a sample file.
/// Returns how many files were written; fewer than requested if the stream ended.
pub fn collect_phrase<S: SampleSource>(
    pipeline: &mut WindowPipeline<S>,
    recorder: &DataRecorder,
    phrase: &str,
    start: usize,
    end: usize,
    cancel: &AtomicBool,
) -> Result<usize, PipelineError> {
    info!("collecting data for the phrase: '{phrase}'");
    let mut saved = 0;
    for index in start..=end {
        if cancel.load(Ordering::Relaxed) {
            break;
        }
        let Some(window) = pipeline.pump_window()? else {
            warn!("stream ended while collecting '{phrase}' ({saved} windows saved)");
            return Ok(saved);
        };
        recorder.save_window(&window, phrase, index)?;
        saved += 1;
    }
    info!("completed collecting data for phrase: '{phrase}'");
    Ok(saved)
}
