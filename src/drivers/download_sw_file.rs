use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use std::fs;
use tracing::{info, warn};

use crate::{constants::SW_FILE_NAME, env_state::MsisEnv, msis_errors::MsisError};

/// Download the space weather file and store it verbatim.
///
/// Arguments
/// ---------
/// * `env`: the environment holding the http client
/// * `url`: the location of the file, `file://` URLs are read locally
/// * `path`: where the file is written, parent directories are created if needed.
///   The bytes go to a `.part` sibling first and are renamed into place, so `path`
///   never holds a partial file.
///
/// Return
/// ------
/// * Ok(()) once the file is written
/// * An error if the download or the write fails
pub fn download_sw_file(env: &MsisEnv, url: &str, path: &Utf8Path) -> Result<(), MsisError> {
    warn!("Downloading ap and F10.7 data from {url}");

    let bytes = env.get_bytes_from_url(url)?;

    if let Some(parent) = path.parent() {
        if !parent.as_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let partial = path.with_extension("part");
    let written = fs::write(&partial, &bytes).and_then(|_| fs::rename(&partial, path));
    if let Err(err) = written {
        // best effort, the write error is the one reported
        let _ = fs::remove_file(&partial);
        return Err(err.into());
    }

    info!("Space weather data written to {path} ({} bytes)", bytes.len());
    Ok(())
}

/// Get the space weather file, downloading it only when it is not already present.
///
/// Arguments
/// ---------
/// * `env`: the environment holding the http client
/// * `url`: the remote location used if the file is missing
/// * `path`: the local copy of the file
///
/// Return
/// ------
/// * The path to the local file
pub fn ensure_local_file(
    env: &MsisEnv,
    url: &str,
    path: &Utf8Path,
) -> Result<Utf8PathBuf, MsisError> {
    if !path.exists() {
        download_sw_file(env, url, path)?;
    }
    Ok(path.to_path_buf())
}

/// Default location of the cached space weather file:
/// `<user cache dir>/msiskit_cache/SW-All.csv`.
pub fn default_cache_path() -> Result<Utf8PathBuf, MsisError> {
    let base_dir = BaseDirs::new().ok_or_else(|| {
        MsisError::UnableToCreateBaseDir("Cannot find the user base directory".to_string())
    })?;

    let cache_path = Utf8Path::from_path(base_dir.cache_dir()).ok_or_else(|| {
        MsisError::Utf8PathError(format!(
            "cache directory is not valid UTF-8: {}",
            base_dir.cache_dir().display()
        ))
    })?;

    Ok(cache_path.join("msiskit_cache").join(SW_FILE_NAME))
}
