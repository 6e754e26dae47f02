use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use esl_fluency::{EvaluationConfig, FluencyEvaluator, ScoreResult};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// esl-fluency - Oral fluency scoring for recorded English answers
///
/// Scores speech rate, pausing, run length, rate stability and optionally
/// prosody, then maps the composite onto a proficiency level.
#[derive(Parser, Debug)]
#[command(name = "esl-fluency")]
#[command(version = "0.1.0")]
#[command(about = "Oral fluency scoring for recorded English answers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score one recording and print the result as JSON.
    Evaluate(EvaluateArgs),
    /// Score many recordings and write one CSV row per file.
    Batch(BatchArgs),
}

#[derive(Args, Debug, Clone)]
struct EvaluateArgs {
    /// Audio file (WAV, MP3, FLAC, OGG, ...)
    #[arg(value_name = "FILE")]
    input: PathBuf,

    #[command(flatten)]
    options: EvaluationArgs,
}

#[derive(Args, Debug, Clone)]
struct BatchArgs {
    #[arg(value_name = "FILES", required = true)]
    inputs: Vec<PathBuf>,

    /// CSV file to write; stdout when omitted
    #[arg(long, value_name = "PATH")]
    out_csv: Option<PathBuf>,

    #[command(flatten)]
    options: EvaluationArgs,
}

#[derive(Args, Debug, Clone, Default)]
struct EvaluationArgs {
    /// Voice activity model identifier
    #[arg(long, value_name = "ID")]
    vad_model: Option<String>,

    /// Access token for gated voice activity models
    #[arg(long, value_name = "TOKEN", env = "FLUENCY_HF_TOKEN", hide_env_values = true)]
    hf_token: Option<String>,

    /// Whisper model size (tiny.en, base.en, small.en, ...)
    #[arg(long, value_name = "SIZE")]
    asr_model: Option<String>,

    /// Directory holding ggml-<size>.bin Whisper weights
    #[arg(long, value_name = "DIR")]
    models_dir: Option<PathBuf>,

    /// Fold pitch and loudness variability into the score
    #[arg(long)]
    use_prosody: bool,

    /// Minimum silence in seconds counted as a long pause
    #[arg(long, value_name = "SECONDS")]
    long_pause_sec: Option<f64>,

    /// Inter-word gap in seconds that ends a fluent run
    #[arg(long, value_name = "SECONDS")]
    mlfr_pause_sec: Option<f64>,
}

impl EvaluationArgs {
    /// Layer command-line flags over `config`, usually read from the environment.
    fn apply(&self, mut config: EvaluationConfig) -> Result<EvaluationConfig> {
        if let Some(model) = &self.vad_model {
            config.vad_model_id = model.clone();
        }
        if let Some(token) = &self.hf_token {
            config.credential = Some(token.clone());
        }
        if let Some(size) = &self.asr_model {
            config.asr_model_size = size.clone();
        }
        if let Some(dir) = &self.models_dir {
            config.models_dir = dir.clone();
        }
        config.use_prosody |= self.use_prosody;
        if let Some(seconds) = self.long_pause_sec {
            config.long_pause_sec = seconds;
        }
        if let Some(seconds) = self.mlfr_pause_sec {
            config.mlfr_pause_sec = seconds;
        }
        config
            .validate()
            .context("Invalid evaluation settings")?;
        Ok(config)
    }
}

const CSV_HEADER: [&str; 15] = [
    "path",
    "Duration",
    "N_words",
    "SR",
    "AR",
    "PR",
    "LPF",
    "MLFR",
    "RateSD",
    "F0_IQR",
    "RMS_IQR",
    "Timing_Score",
    "Prosody_Score",
    "Fluency",
    "Level",
];

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Evaluate(args) => handle_evaluate(&args),
        Command::Batch(args) => handle_batch(&args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn handle_evaluate(args: &EvaluateArgs) -> Result<()> {
    let config = args.options.apply(EvaluationConfig::from_env())?;
    let evaluator = FluencyEvaluator::new(config);
    let result = evaluator.evaluate(&args.input);
    let json = serde_json::to_string_pretty(&result).context("Failed to serialise result")?;
    println!("{json}");
    Ok(())
}

fn handle_batch(args: &BatchArgs) -> Result<()> {
    let config = args.options.apply(EvaluationConfig::from_env())?;
    let evaluator = FluencyEvaluator::new(config);
    let results = evaluator.evaluate_batch(&args.inputs);

    match &args.out_csv {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create CSV output {}", path.display()))?;
            write_csv(file, &results)?;
            info!(rows = results.len(), path = %path.display(), "wrote batch results");
        }
        None => write_csv(io::stdout().lock(), &results)?,
    }

    print_summary(&results);
    Ok(())
}

fn write_csv<W: io::Write>(writer: W, results: &[(PathBuf, ScoreResult)]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADER)?;
    for (path, result) in results {
        csv.write_record(csv_row(path, result))?;
    }
    csv.flush().context("Failed to flush CSV output")?;
    Ok(())
}

fn csv_row(path: &Path, result: &ScoreResult) -> Vec<String> {
    let f = &result.features;
    vec![
        path.display().to_string(),
        format!("{:.2}", result.duration),
        result.n_words.to_string(),
        format!("{:.2}", f.speech_rate),
        format!("{:.2}", f.articulation_rate),
        format!("{:.3}", f.pause_ratio),
        format!("{:.2}", f.long_pause_frequency),
        format!("{:.2}", f.mean_fluent_run),
        format!("{:.2}", f.rate_sd),
        format!("{:.2}", f.f0_iqr),
        format!("{:.2}", f.rms_iqr),
        format!("{:.3}", result.timing_score),
        result
            .prosody_score
            .map(|score| format!("{score:.3}"))
            .unwrap_or_default(),
        format!("{:.3}", result.fluency),
        result.level.to_string(),
    ]
}

fn print_summary(results: &[(PathBuf, ScoreResult)]) {
    if results.is_empty() {
        return;
    }
    for (path, result) in results {
        eprintln!(
            "{}: {:.3} ({})",
            path.display(),
            result.fluency,
            result.level
        );
    }
    let failed = results.iter().filter(|(_, r)| r.error.is_some()).count();
    let mean = results.iter().map(|(_, r)| r.fluency).sum::<f64>() / results.len() as f64;
    eprintln!(
        "Scored {} file(s), {} unusable, mean fluency {:.3}",
        results.len(),
        failed,
        mean
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use esl_fluency::{FeatureSet, Level};

    #[test]
    fn parses_evaluate_with_overrides() {
        let cli = Cli::try_parse_from([
            "esl-fluency",
            "evaluate",
            "answer.wav",
            "--use-prosody",
            "--long-pause-sec",
            "1.0",
            "--asr-model",
            "base.en",
        ])
        .unwrap();
        let Command::Evaluate(args) = cli.command else {
            panic!("expected evaluate subcommand");
        };
        assert_eq!(args.input, PathBuf::from("answer.wav"));

        let config = args.options.apply(EvaluationConfig::default()).unwrap();
        assert!(config.use_prosody);
        assert_eq!(config.long_pause_sec, 1.0);
        assert_eq!(config.mlfr_pause_sec, 0.25);
        assert_eq!(config.asr_model_size, "base.en");
    }

    #[test]
    fn batch_requires_at_least_one_file() {
        assert!(Cli::try_parse_from(["esl-fluency", "batch"]).is_err());
        let cli =
            Cli::try_parse_from(["esl-fluency", "batch", "a.wav", "b.wav", "--out-csv", "out.csv"])
                .unwrap();
        let Command::Batch(args) = cli.command else {
            panic!("expected batch subcommand");
        };
        assert_eq!(args.inputs.len(), 2);
        assert_eq!(args.out_csv, Some(PathBuf::from("out.csv")));
    }

    #[test]
    fn rejects_non_positive_threshold() {
        let options = EvaluationArgs {
            mlfr_pause_sec: Some(0.0),
            ..EvaluationArgs::default()
        };
        assert!(options.apply(EvaluationConfig::default()).is_err());
    }

    #[test]
    fn csv_row_matches_header() {
        let result = ScoreResult {
            fluency: 0.825,
            level: Level::Advanced,
            timing_score: 0.825,
            prosody_score: None,
            n_words: 55,
            duration: 25.4,
            features: FeatureSet {
                speech_rate: 129.9,
                ..FeatureSet::default()
            },
            error: None,
        };
        let row = csv_row(Path::new("a.wav"), &result);
        assert_eq!(row.len(), CSV_HEADER.len());
        assert_eq!(row[3], "129.90");
        assert_eq!(row[12], "");
        assert_eq!(row[14], "Advanced");
    }
}
