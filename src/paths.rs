use std::path::PathBuf;
use std::sync::OnceLock;

static EXE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the directory containing the executable.
pub fn get_exe_dir() -> &'static PathBuf {
    EXE_DIR.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Returns the logs directory: `<exe_dir>/logs/`
pub fn get_logs_dir() -> PathBuf {
    get_exe_dir().join("logs")
}

/// Returns the configuration file path: `<exe_dir>/config.json`
pub fn get_config_path() -> PathBuf {
    get_exe_dir().join("config.json")
}

/// Returns the synthesized-audio cache directory.
///
/// Lives under the user cache dir so entries survive reinstalls of the
/// executable; falls back to `<exe_dir>/cache/audio/` when no user cache
/// directory is available.
pub fn get_speech_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|d| d.join("etspilot").join("audio"))
        .unwrap_or_else(|| get_exe_dir().join("cache").join("audio"))
}

/// Ensures all output directories exist. Call at startup.
pub fn ensure_directories() -> std::io::Result<()> {
    std::fs::create_dir_all(get_logs_dir())?;
    std::fs::create_dir_all(get_speech_cache_dir())?;
    Ok(())
}
