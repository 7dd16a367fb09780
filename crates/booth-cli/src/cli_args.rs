use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "booth",
    about = "AR photo booth backend: voice replies and photo compositing",
    version
)]
pub struct CliArgs {
    /// Gateway bind address.
    #[arg(long, env = "BOOTH_BIND", default_value = "0.0.0.0:8080")]
    pub bind: String,

    /// SpeechKit API key, shared by recognition, completion, and synthesis.
    #[arg(long, env = "SPEECHKIT_API_KEY")]
    pub speechkit_api_key: String,

    /// SpeechKit folder id.
    #[arg(long, env = "SPEECHKIT_FOLDER_ID")]
    pub speechkit_folder_id: String,

    /// Recognition service base URL.
    #[arg(
        long,
        env = "BOOTH_STT_API_BASE",
        default_value = "https://stt.api.cloud.yandex.net"
    )]
    pub stt_api_base: String,

    /// Completion service base URL.
    #[arg(
        long,
        env = "BOOTH_LLM_API_BASE",
        default_value = "https://llm.api.cloud.yandex.net"
    )]
    pub llm_api_base: String,

    /// Synthesis service base URL.
    #[arg(
        long,
        env = "BOOTH_TTS_API_BASE",
        default_value = "https://tts.api.cloud.yandex.net"
    )]
    pub tts_api_base: String,

    /// Voice-conversion (RVC WebUI) base URL.
    #[arg(
        long,
        env = "BOOTH_RVC_API_BASE",
        default_value = "http://127.0.0.1:7897"
    )]
    pub rvc_api_base: String,

    /// Background-removal service base URL.
    #[arg(
        long,
        env = "BOOTH_REMOVAL_API_BASE",
        default_value = "http://127.0.0.1:7000"
    )]
    pub removal_api_base: String,

    /// OpenRouter base URL for the image-edit model.
    #[arg(
        long,
        env = "BOOTH_OPENROUTER_API_BASE",
        default_value = "https://openrouter.ai"
    )]
    pub openrouter_api_base: String,

    /// OpenRouter API key for the image-edit model.
    #[arg(long, env = "OPENROUTER_API_KEY")]
    pub openrouter_api_key: String,

    /// ffmpeg binary used for audio transcoding.
    #[arg(long, env = "BOOTH_FFMPEG_BIN", default_value = "ffmpeg")]
    pub ffmpeg_bin: String,

    /// Directory holding `bg_<character>.png` background assets.
    #[arg(long, env = "BOOTH_ASSETS_DIR", default_value = "assets")]
    pub assets_dir: PathBuf,

    /// Root for per-request scratch directories.
    #[arg(long, env = "BOOTH_SCRATCH_DIR", default_value = "scratch")]
    pub scratch_dir: PathBuf,
}
