// src/main.rs
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::{error, info, warn};

use imu_gesture::classifier::harness::{evaluate, forest_grid, grid_search, knn_grid, score};
use imu_gesture::dataset::{load_samples, DatasetBuilder};
use imu_gesture::drivers::{open_serial, WindowPipeline};
use imu_gesture::engine::{collect_phrase, spawn_prediction, PredictionService};
use imu_gesture::recorder::DataRecorder;
use imu_gesture::types::{PredictionEvent, StopReason};
use imu_gesture::{ModelSpec, PipelineConfig, TrainedModel};

#[derive(Parser)]
#[command(name = "imu-gesture")]
#[command(about = "Capture, train and recognize wearable IMU gestures", long_about = None)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CommonArgs {
    /// JSON pipeline configuration; defaults apply to anything it leaves out
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Serial device of the wearable
    #[arg(long, global = true)]
    port: Option<String>,

    #[arg(long, global = true)]
    baud: Option<u32>,

    /// Samples per window (must match the model)
    #[arg(long, global = true)]
    timesteps: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record labeled windows from the live sensor
    Collect {
        /// Phrases to record, in order
        #[arg(long = "phrase", default_values_t = ["help".to_string(), "water".to_string(), "call_nurse".to_string(), "pain".to_string()])]
        phrases: Vec<String>,

        #[arg(long, default_value = "21")]
        start_index: usize,

        #[arg(long, default_value = "30")]
        end_index: usize,

        /// Directory for the recorded sample files
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Train and compare classifiers, then save the best one
    Train {
        #[arg(long, default_value = "train_data.csv")]
        train_manifest: PathBuf,

        #[arg(long, default_value = "val_data.csv")]
        val_manifest: PathBuf,

        /// Directory holding the sample files named in the manifests
        #[arg(long, default_value = "help-words")]
        data_dir: PathBuf,

        #[arg(long, default_value = "model.json")]
        model_out: PathBuf,

        /// Cross-validate random forest and kNN grids and save the best configuration
        #[arg(long)]
        grid_search: bool,

        #[arg(long, default_value = "3")]
        folds: usize,
    },

    /// Classify live windows from the sensor until the stream ends or Ctrl-C
    Predict {
        #[arg(long, default_value = "model.json")]
        model: PathBuf,
    },

    /// Classify one stored sample file
    Replay {
        #[arg(long, default_value = "model.json")]
        model: PathBuf,

        #[arg(long)]
        file: PathBuf,
    },
}

fn load_config(common: &CommonArgs) -> Result<PipelineConfig> {
    let mut config = match &common.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(port) = &common.port {
        config.serial_port = port.clone();
    }
    if let Some(baud) = common.baud {
        config.baud_rate = baud;
    }
    if let Some(timesteps) = common.timesteps {
        config.timesteps = timesteps;
    }
    config.validate()?;
    Ok(config)
}

fn install_cancel_flag() -> Result<Arc<AtomicBool>> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .context("failed to install Ctrl-C handler")?;
    Ok(cancel)
}

fn cmd_collect(
    config: PipelineConfig,
    phrases: &[String],
    start: usize,
    end: usize,
    output: Option<PathBuf>,
) -> Result<()> {
    if end < start {
        bail!("end index {end} is before start index {start}");
    }
    let cancel = install_cancel_flag()?;
    let output_dir = output.unwrap_or_else(|| config.output_dir.clone());
    let recorder = DataRecorder::new(&output_dir, config.sample_extension.clone())?;
    let source = open_serial(&config)?.with_cancel(Arc::clone(&cancel));
    let mut pipeline = WindowPipeline::new(source, &config);
    for phrase in phrases {
        let wanted = end - start + 1;
        let saved = collect_phrase(&mut pipeline, &recorder, phrase, start, end, &cancel)?;
        if saved < wanted {
            warn!("only {saved} of {wanted} windows saved for '{phrase}', stopping");
            break;
        }
    }
    let stats = pipeline.source().stats();
    info!(
        "collection finished: {} lines accepted, {} skipped",
        stats.accepted, stats.skipped
    );
    Ok(())
}

fn cmd_train(
    config: PipelineConfig,
    train_manifest: PathBuf,
    val_manifest: PathBuf,
    data_dir: PathBuf,
    model_out: PathBuf,
    use_grid: bool,
    folds: usize,
) -> Result<()> {
    let builder = DatasetBuilder::new(&config, &data_dir);
    let train = builder
        .build_from_manifest(&train_manifest)
        .with_context(|| format!("failed to read {}", train_manifest.display()))?;
    let test = builder
        .build_from_manifest(&val_manifest)
        .with_context(|| format!("failed to read {}", val_manifest.display()))?;
    info!("NaN in X_train: {}", train.non_finite_count());
    info!("NaN in X_test: {}", test.non_finite_count());
    if train.is_empty() || test.is_empty() {
        bail!(
            "no usable examples ({} train, {} validation)",
            train.len(),
            test.len()
        );
    }

    let mut best: Option<(TrainedModel, f64)> = None;
    for spec in ModelSpec::zoo() {
        info!("Training and evaluating {spec}...");
        let (model, report) = evaluate(&spec, &train, &test, &config)?;
        println!("{report}");
        if best.as_ref().map_or(true, |(_, acc)| report.accuracy > *acc) {
            best = Some((model, report.accuracy));
        }
    }

    let chosen = if use_grid {
        let mut grid = forest_grid(&[50, 100, 200], &[None, Some(10), Some(20)]);
        grid.extend(knn_grid(&[1, 3, 5, 11, 25]));
        let result = grid_search(&grid, &train, folds, &config)?;
        println!("Best parameters: {}", result.best);
        let tuned = TrainedModel::train(&result.best, &train, &config)?;
        let report = score(&tuned, &test)?;
        println!("Tuned model\n{report}");
        tuned
    } else {
        match best {
            Some((model, _)) => model,
            None => bail!("no model could be trained"),
        }
    };
    chosen.save(&model_out)?;
    println!("model saved in {}", model_out.display());
    Ok(())
}

fn cmd_predict(config: PipelineConfig, model_path: PathBuf) -> Result<()> {
    let model = TrainedModel::load(&model_path)
        .with_context(|| format!("failed to load model {}", model_path.display()))?;
    let service = PredictionService::new(model, config.clone())?;
    let cancel = install_cancel_flag()?;
    let source = open_serial(&config)?.with_cancel(Arc::clone(&cancel));
    let (rx, handle) = spawn_prediction(service, source, cancel);
    for event in rx {
        match event {
            PredictionEvent::Label { label, .. } => println!("Predicted Phrase: {label}"),
            PredictionEvent::Finished { windows, reason } => {
                if let StopReason::Transport(e) = &reason {
                    error!("Serial error: {e}");
                }
                info!("{windows} windows classified");
            }
        }
    }
    match handle.join() {
        Ok(result) => {
            result?;
        }
        Err(_) => bail!("prediction thread panicked"),
    }
    Ok(())
}

fn cmd_replay(config: PipelineConfig, model_path: PathBuf, file: PathBuf) -> Result<()> {
    let model = TrainedModel::load(&model_path)
        .with_context(|| format!("failed to load model {}", model_path.display()))?;
    let service = PredictionService::new(model, config.clone())?;
    let samples =
        load_samples(&file).with_context(|| format!("failed to read {}", file.display()))?;
    if samples.len() != config.timesteps {
        info!(
            "{} has {} samples, window adjusted to {}",
            file.display(),
            samples.len(),
            config.timesteps
        );
    }
    let label = service.classify_recording(samples)?;
    println!("Predicted Phrase: {label}");
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let config = load_config(&cli.common)?;
    match cli.command {
        Commands::Collect {
            phrases,
            start_index,
            end_index,
            output,
        } => cmd_collect(config, &phrases, start_index, end_index, output),
        Commands::Train {
            train_manifest,
            val_manifest,
            data_dir,
            model_out,
            grid_search,
            folds,
        } => cmd_train(
            config,
            train_manifest,
            val_manifest,
            data_dir,
            model_out,
            grid_search,
            folds,
        ),
        Commands::Predict { model } => cmd_predict(config, model),
        Commands::Replay { model, file } => cmd_replay(config, model, file),
    }
}
