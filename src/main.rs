use anyhow::Result;
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use subgen::SubgenError;
use subgen::assets::catalog::{get_model, list_models, resolve_name};
use subgen::assets::store::{format_model_info, is_model_installed, list_installed_models};
use subgen::cli::{Cli, Commands, ModelsAction};
use subgen::config::Config;
use subgen::output::ConsoleEvents;
use subgen::pipeline::{Pipeline, RunOutcome, RunRequest};
use subgen::stt::transcriber::TranscribeOptions;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => {
            let Some(input) = cli.input.clone() else {
                let mut cmd = Cli::command();
                cmd.error(
                    clap::error::ErrorKind::MissingRequiredArgument,
                    "no input file; pass a video or audio file, e.g. `subgen talk.mp4`",
                )
                .exit();
            };
            let config = apply_cli_overrides(load_config(cli.config.as_deref())?, &cli);
            run_transcribe(config, input, cli.output, cli.quiet, cli.verbose).await?;
        }
        Some(Commands::Models { action }) => {
            handle_models_command(action, cli.config.as_deref()).await?;
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "subgen",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/subgen/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        let default_path = Config::default_path();
        Config::load_or_default(&default_path)
    };

    Ok(config.with_env_overrides())
}

/// Overlay command-line flags on top of the loaded configuration.
fn apply_cli_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(model) = &cli.model {
        config.stt.model = model.clone();
    }
    if let Some(language) = &cli.language {
        config.stt.language = language.clone();
    }
    if let Some(temperature) = cli.temperature {
        config.stt.temperature = temperature;
    }
    if cli.translate {
        config.stt.translate = true;
    }
    if let Some(prompt) = &cli.prompt {
        config.stt.prompt = Some(prompt.clone());
    }
    if let Some(ffmpeg) = &cli.ffmpeg {
        config.assets.extractor_path = Some(ffmpeg.clone());
    }
    config
}

/// Run the subtitle pipeline on one input file and report the outcome.
async fn run_transcribe(
    config: Config,
    input: PathBuf,
    output: Option<PathBuf>,
    quiet: bool,
    verbose: u8,
) -> Result<()> {
    if verbose >= 1 && !quiet {
        eprintln!("subgen {}", subgen::version_string());
        eprintln!(
            "model {}, language {}, input {}",
            config.stt.model,
            config.stt.language,
            input.display()
        );
    }
    if verbose >= 2 && !quiet {
        eprintln!("models dir {}", config.models_dir().display());
        eprintln!("tools dir {}", config.tools_dir().display());
    }

    let mut pipeline = Pipeline::new()
        .with_events(Arc::new(ConsoleEvents::new(quiet)))
        .with_models_dir(config.models_dir())
        .with_tools_dir(config.tools_dir());
    if let Some(path) = config.assets.extractor_path.clone() {
        pipeline = pipeline.with_extractor_path(path);
    }
    let pipeline = Arc::new(pipeline);

    // First Ctrl+C cancels the run; a second one exits immediately.
    let canceller = Arc::clone(&pipeline);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        canceller.cancel();
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });

    let mut request = RunRequest::new(input);
    request.output = output;
    request.model = config.stt.model.clone();
    request.options = TranscribeOptions {
        language: config.stt.language.clone(),
        temperature: config.stt.temperature,
        translate: config.stt.translate,
        prompt: config.stt.prompt.clone(),
        threads: config.stt.threads,
    };

    let started = std::time::Instant::now();
    match pipeline.run(request).await {
        Ok(RunOutcome::Completed {
            segments,
            subtitle_path,
        }) => {
            subgen::output::clear_line();
            if !quiet {
                let elapsed = Duration::from_secs(started.elapsed().as_secs());
                println!(
                    "{}",
                    format!(
                        "Wrote {} ({} segment(s) in {})",
                        subtitle_path.display(),
                        segments.len(),
                        humantime::format_duration(elapsed)
                    )
                    .green()
                );
            }
        }
        Ok(RunOutcome::Cancelled { segments }) => {
            subgen::output::clear_line();
            if !quiet {
                eprintln!(
                    "{}",
                    format!(
                        "Cancelled with {} segment(s) transcribed; nothing written",
                        segments.len()
                    )
                    .yellow()
                );
            }
            std::process::exit(130);
        }
        Err(e) => {
            subgen::output::clear_line();
            eprintln!("{}", format!("Error: {}", e).red());
            match &e {
                SubgenError::TranscriptionModelNotFound { .. } => {
                    eprintln!("Install it with: subgen models install {}", config.stt.model);
                }
                SubgenError::UnknownModel { .. } => {
                    eprintln!("Run `subgen models list` to see available models.");
                }
                _ => {}
            }
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Handle model management commands.
async fn handle_models_command(
    action: ModelsAction,
    custom_path: Option<&std::path::Path>,
) -> Result<()> {
    let config = load_config(custom_path)?;
    let models_dir = config.models_dir();

    match action {
        ModelsAction::List { json } => {
            if json {
                let entries: Vec<serde_json::Value> = list_models()
                    .iter()
                    .map(|model| {
                        serde_json::json!({
                            "name": model.name,
                            "size": model.size,
                            "label": model.label,
                            "url": model.url,
                            "installed": is_model_installed(&models_dir, model.name),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                println!("Available models:");
                for model in list_models() {
                    println!("  {}", format_model_info(&models_dir, model));
                }
                let extras: Vec<String> = list_installed_models(&models_dir)
                    .into_iter()
                    .filter(|name| get_model(name).is_none())
                    .collect();
                if !extras.is_empty() {
                    println!();
                    println!("Installed outside the catalog:");
                    for name in extras {
                        println!("  {name}");
                    }
                }
            }
        }
        ModelsAction::Install { name } => {
            install_model(&models_dir, &name).await?;
        }
        ModelsAction::Use { name } => {
            let resolved = resolve_name(&name);
            if resolved != name {
                println!("Resolved '{name}' to '{resolved}'");
            }
            if get_model(resolved).is_none() {
                eprintln!("Unknown model: '{name}'");
                eprintln!("Run `subgen models list` to see available models.");
                std::process::exit(1);
            }

            let config_path = custom_path
                .map(std::path::PathBuf::from)
                .unwrap_or_else(Config::default_path);
            Config::update_model(&config_path, resolved)?;
            println!("Default model set to '{resolved}'");

            if !is_model_installed(&models_dir, resolved) {
                println!(
                    "Note: model not yet downloaded. Run `subgen models install {resolved}` before transcribing."
                );
            }
        }
    }
    Ok(())
}

#[cfg(feature = "download")]
async fn install_model(models_dir: &std::path::Path, name: &str) -> Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};
    use subgen::assets::fetcher::{FetchOutcome, download_model};
    use tokio_util::sync::CancellationToken;

    let resolved = resolve_name(name);
    if resolved != name {
        println!("Resolved '{name}' to '{resolved}'");
    }
    if let Some(info) = get_model(resolved) {
        println!("Downloading {} ({})", info.label, info.size);
    }

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_cancel.cancel();
        }
    });

    // Hidden automatically when stderr is not a terminal.
    let bar = ProgressBar::no_length();
    bar.set_style(
        ProgressStyle::with_template(
            "{bar:30.cyan/blue} {bytes}/{total_bytes} {bytes_per_sec} (eta {eta})",
        )?
        .progress_chars("=>-"),
    );

    let result = download_model(models_dir, resolved, &cancel, |progress| {
        if let Some(total) = progress.total_bytes {
            bar.set_length(total);
        }
        bar.set_position(progress.bytes_received);
    })
    .await;
    bar.finish_and_clear();

    match result {
        Ok((path, FetchOutcome::AlreadyPresent)) => {
            println!("Model '{resolved}' already installed");
            println!("Location: {}", path.display());
        }
        Ok((path, FetchOutcome::Downloaded)) => {
            println!("Model '{resolved}' installed successfully");
            println!("Location: {}", path.display());
        }
        Err(SubgenError::Cancelled) => {
            eprintln!("Download cancelled");
            std::process::exit(130);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

#[cfg(not(feature = "download"))]
async fn install_model(_models_dir: &std::path::Path, name: &str) -> Result<()> {
    anyhow::bail!(
        "this build does not include the downloader; rebuild with the `download` feature or place '{name}' in the models directory manually"
    )
}
