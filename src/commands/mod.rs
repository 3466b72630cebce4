//! Command-line surface over [`AppController`].

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::app::AppController;
use crate::domain::{
    parse_due_date, AudioClip, DomainError, Priority, Quantization, TaskOverrides, TaskRequest,
};
use crate::ports::ProgressCallback;

#[derive(Parser, Debug)]
#[command(name = "task-intel")]
#[command(author, version, about = "Infer priority and due date of tasks from text or speech")]
pub struct Cli {
    /// Directory for config, models, lexicon and logs
    #[arg(long, global = true, env = "TASK_INTEL_HOME", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Infer priority and due date of a task description
    Infer {
        #[arg(long)]
        text: String,
        #[command(flatten)]
        overrides: OverrideArgs,
        #[command(flatten)]
        clock: ClockArgs,
    },
    /// Transcribe an audio file
    Transcribe {
        #[command(flatten)]
        audio: AudioArgs,
    },
    /// Resolve a new task from text or audio
    Create {
        #[arg(long, required_unless_present = "file")]
        text: Option<String>,
        #[command(flatten)]
        audio: OptionalAudioArgs,
        #[command(flatten)]
        overrides: OverrideArgs,
        #[command(flatten)]
        clock: ClockArgs,
    },
    /// Compute the fields an update writes
    Update {
        /// Text currently stored on the task
        #[arg(long)]
        current: String,
        /// Replacement text, if the update changes it
        #[arg(long)]
        text: Option<String>,
        #[command(flatten)]
        overrides: OverrideArgs,
        #[command(flatten)]
        clock: ClockArgs,
    },
    /// Manage speech models
    Models {
        #[command(subcommand)]
        action: ModelsAction,
    },
    /// Inspect or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ModelsAction {
    /// Show the catalog and the installed model files
    List,
    /// Download a speech model (defaults to the configured one)
    Download {
        id: Option<String>,
        #[arg(long, value_parser = parse_quantization)]
        quant: Option<Quantization>,
    },
    /// Remove an installed model file
    Delete {
        id: String,
        #[arg(long, value_parser = parse_quantization)]
        quant: Option<Quantization>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    Show,
    Path,
    /// Toggle local-only mode, which blocks all network access
    SetLocalOnly {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

#[derive(Args, Debug, Default)]
pub struct OverrideArgs {
    /// Explicit priority: none, low, medium or high
    #[arg(long)]
    pub priority: Option<Priority>,
    /// Explicit due date (YYYY-MM-DD), or "none" to clear it
    #[arg(long, value_parser = parse_due_date_arg)]
    pub due_date: Option<DueDateArg>,
}

impl OverrideArgs {
    fn to_overrides(&self) -> TaskOverrides {
        TaskOverrides {
            priority: self.priority,
            due_date: self.due_date.map(|d| d.0),
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct ClockArgs {
    /// Reference date for relative phrases; defaults to the local date
    #[arg(long, value_parser = parse_date)]
    pub today: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub struct AudioArgs {
    #[arg(long = "audio", value_name = "FILE")]
    pub file: PathBuf,
    /// MIME type; guessed from the extension when omitted
    #[arg(long)]
    pub mime: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct OptionalAudioArgs {
    #[arg(long = "audio", value_name = "FILE")]
    pub file: Option<PathBuf>,
    #[arg(long, requires = "file")]
    pub mime: Option<String>,
}

/// Due date override; `None` inside means "explicitly no due date".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueDateArg(pub Option<NaiveDate>);

fn parse_due_date_arg(value: &str) -> Result<DueDateArg, DomainError> {
    if value.trim().eq_ignore_ascii_case("none") {
        return Ok(DueDateArg(None));
    }
    parse_due_date(value).map(|d| DueDateArg(Some(d)))
}

fn parse_date(value: &str) -> Result<NaiveDate, DomainError> {
    parse_due_date(value)
}

fn parse_quantization(value: &str) -> Result<Quantization, DomainError> {
    Quantization::from_suffix(&value.to_lowercase())
        .ok_or_else(|| DomainError::Validation(format!("Unknown quantization '{}'", value)))
}

fn mime_from_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "m4a" | "mp4" => "audio/mp4",
        "aac" => "audio/aac",
        "flac" => "audio/flac",
        "ogg" | "oga" => "audio/ogg",
        _ => "application/octet-stream",
    }
}

fn read_clip(file: &Path, mime: Option<&str>) -> Result<AudioClip, DomainError> {
    let bytes = fs::read(file)?;
    let mime = mime.unwrap_or_else(|| mime_from_extension(file));
    Ok(AudioClip::new(bytes, mime))
}

#[derive(Serialize)]
struct AppPaths {
    data_dir: String,
    logs_dir: String,
    config_path: String,
}

#[derive(Serialize)]
struct Transcript {
    text: String,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), DomainError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn download_progress() -> ProgressCallback {
    Box::new(|downloaded, total| {
        if total > 0 {
            eprint!("\rDownloading: {:>3}%", downloaded * 100 / total);
        } else {
            eprint!("\rDownloading: {} bytes", downloaded);
        }
    })
}

/// Execute `command` against `controller`, printing the result as JSON.
pub fn execute(controller: &AppController, command: Command) -> Result<(), DomainError> {
    match command {
        Command::Infer {
            text,
            overrides,
            clock,
        } => {
            let intent = controller
                .infer(&text, clock.today)?
                .merged_with(&overrides.to_overrides());
            print_json(&intent)
        }
        Command::Transcribe { audio } => {
            let clip = read_clip(&audio.file, audio.mime.as_deref())?;
            let text = controller.transcribe(clip)?;
            print_json(&Transcript { text })
        }
        Command::Create {
            text,
            audio,
            overrides,
            clock,
        } => {
            let clip = audio
                .file
                .as_deref()
                .map(|file| read_clip(file, audio.mime.as_deref()))
                .transpose()?;
            let request = TaskRequest {
                text,
                audio: clip,
                overrides: overrides.to_overrides(),
            };
            print_json(&controller.create(request, clock.today)?)
        }
        Command::Update {
            current,
            text,
            overrides,
            clock,
        } => {
            let patch = controller.update(
                &current,
                text.as_deref(),
                overrides.to_overrides(),
                clock.today,
            )?;
            print_json(&patch)
        }
        Command::Models { action } => match action {
            ModelsAction::List => print_json(&serde_json::json!({
                "catalog": controller.model_catalog()?,
                "installed": controller.list_installed_models()?,
            })),
            ModelsAction::Download { id, quant } => {
                let path =
                    controller.download_model(id.as_deref(), quant, Some(download_progress()));
                eprintln!();
                print_json(&serde_json::json!({ "path": path? }))
            }
            ModelsAction::Delete { id, quant } => {
                let quant = quant.unwrap_or(controller.config().models.quantization);
                controller.delete_model(&id, quant)?;
                print_json(&serde_json::json!({ "deleted": id, "quantization": quant }))
            }
        },
        Command::Config { action } => match action {
            ConfigAction::Show => print_json(&controller.config()),
            ConfigAction::Path => print_json(&AppPaths {
                data_dir: controller.data_dir(),
                logs_dir: controller.logs_dir(),
                config_path: controller.config_path(),
            }),
            ConfigAction::SetLocalOnly { enabled } => {
                let mut config = controller.config();
                config.privacy.local_only = enabled;
                controller.update_config(config)?;
                print_json(&serde_json::json!({ "local_only": enabled }))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("task-intel").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_infer_with_overrides() {
        let cli = parse(&[
            "infer", "--text", "Ship it", "--priority", "high", "--due-date", "none",
            "--today", "2024-01-10",
        ]);

        match cli.command {
            Command::Infer {
                text,
                overrides,
                clock,
            } => {
                assert_eq!(text, "Ship it");
                let overrides = overrides.to_overrides();
                assert_eq!(overrides.priority, Some(Priority::High));
                assert_eq!(overrides.due_date, Some(None));
                assert_eq!(clock.today, NaiveDate::from_ymd_opt(2024, 1, 10));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_create_requires_text_or_audio() {
        let result = Cli::try_parse_from(["task-intel", "create"]);
        assert!(result.is_err());

        let cli = parse(&["create", "--audio", "memo.m4a"]);
        assert!(matches!(cli.command, Command::Create { text: None, .. }));
    }

    #[test]
    fn test_invalid_due_date_rejected() {
        let result = Cli::try_parse_from(["task-intel", "infer", "--text", "x", "--due-date", "soon"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_quantization_and_mime_helpers() {
        assert_eq!(parse_quantization("Q8_0").unwrap(), Quantization::Q8_0);
        assert!(parse_quantization("q4").is_err());
        assert_eq!(mime_from_extension(Path::new("a.MP3")), "audio/mpeg");
        assert_eq!(mime_from_extension(Path::new("a")), "application/octet-stream");
    }
}
