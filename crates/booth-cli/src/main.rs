//! `booth` binary: configuration, provider wiring, and server startup.

mod cli_args;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use booth_characters::SelectionPolicy;
use booth_compose::BoothFlows;
use booth_gateway::{run_server, AppState};
use booth_history::HistoryStore;
use booth_pipeline::ReplyPipeline;
use booth_providers::{
    HttpBackgroundRemover, HttpBackgroundRemoverConfig, OpenRouterImageEditor,
    OpenRouterImageEditorConfig, RvcConverter, RvcConverterConfig, SpeechKitCompleter,
    SpeechKitCompleterConfig, SpeechKitRecognizer, SpeechKitRecognizerConfig,
    SpeechKitSynthesizer, SpeechKitSynthesizerConfig,
};
use booth_transcode::FfmpegTranscoder;

use crate::cli_args::CliArgs;

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn build_state(args: &CliArgs, scratch_dir: PathBuf) -> Result<AppState> {
    let recognizer = SpeechKitRecognizer::new(SpeechKitRecognizerConfig::new(
        &args.stt_api_base,
        &args.speechkit_api_key,
        &args.speechkit_folder_id,
    ))
    .context("failed to build recognition client")?;
    let completer = SpeechKitCompleter::new(SpeechKitCompleterConfig::new(
        &args.llm_api_base,
        &args.speechkit_api_key,
        &args.speechkit_folder_id,
    ))
    .context("failed to build completion client")?;
    let synthesizer = SpeechKitSynthesizer::new(SpeechKitSynthesizerConfig::new(
        &args.tts_api_base,
        &args.speechkit_api_key,
        &args.speechkit_folder_id,
    ))
    .context("failed to build synthesis client")?;
    let converter = RvcConverter::new(RvcConverterConfig::new(&args.rvc_api_base))
        .context("failed to build voice-conversion client")?;
    let remover =
        HttpBackgroundRemover::new(HttpBackgroundRemoverConfig::new(&args.removal_api_base))
            .context("failed to build background-removal client")?;
    let editor = OpenRouterImageEditor::new(OpenRouterImageEditorConfig::new(
        &args.openrouter_api_base,
        &args.openrouter_api_key,
    ))
    .context("failed to build image-edit client")?;

    let pipeline = Arc::new(ReplyPipeline::new(
        Arc::new(recognizer),
        Arc::new(completer),
        Arc::new(synthesizer),
        Arc::new(converter),
        Arc::new(FfmpegTranscoder::new(&args.ffmpeg_bin)),
        Arc::new(HistoryStore::new()),
        scratch_dir,
    ));
    let flows = Arc::new(BoothFlows::new(
        Arc::new(remover),
        Arc::new(editor),
        SelectionPolicy::from_entropy(),
        args.assets_dir.clone(),
    ));
    Ok(AppState::new(pipeline, flows))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = CliArgs::parse();

    std::fs::create_dir_all(&args.scratch_dir)
        .with_context(|| format!("failed to create {}", args.scratch_dir.display()))?;

    let state = build_state(&args, args.scratch_dir.clone())?;
    run_server(&args.bind, state).await
}
