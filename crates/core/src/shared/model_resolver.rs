use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("model file not found: {0}")]
    MissingExplicit(PathBuf),
    #[error("model {name} not found (searched {searched:?}) and no download URL configured")]
    NotFound { name: String, searched: Vec<PathBuf> },
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Where to look for a model file.
#[derive(Default)]
pub struct ModelLookup<'a> {
    /// User-supplied path; when set, nothing else is searched.
    pub explicit: Option<&'a Path>,
    /// Directory shipped next to the binary.
    pub bundled_dir: Option<&'a Path>,
    /// Fetched into the cache when the file is nowhere on disk.
    pub url: Option<&'a str>,
}

/// Resolve a model file by name.
///
/// Resolution order:
/// 1. Explicit path
/// 2. User cache directory (platform-specific)
/// 3. Bundled directory
/// 4. Download from URL into the cache
pub fn resolve(
    name: &str,
    lookup: &ModelLookup<'_>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    if let Some(path) = lookup.explicit {
        return resolve_explicit(path);
    }
    resolve_in(&model_cache_dir()?, name, lookup, progress)
}

fn resolve_explicit(path: &Path) -> Result<PathBuf, ModelResolveError> {
    if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(ModelResolveError::MissingExplicit(path.to_path_buf()))
    }
}

fn resolve_in(
    cache_dir: &Path,
    name: &str,
    lookup: &ModelLookup<'_>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let cached_path = cache_dir.join(name);
    if cached_path.exists() {
        log::debug!("Using cached model {}", cached_path.display());
        return Ok(cached_path);
    }

    let mut searched = vec![cached_path.clone()];
    if let Some(dir) = lookup.bundled_dir {
        let bundled_path = dir.join(name);
        if bundled_path.exists() {
            return Ok(bundled_path);
        }
        searched.push(bundled_path);
    }

    let Some(url) = lookup.url else {
        return Err(ModelResolveError::NotFound {
            name: name.to_string(),
            searched,
        });
    };

    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    log::info!("Downloading {name} from {url}");
    download(url, &cached_path, progress)?;
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/Mindless Attractor/models/`
/// - Linux: `$XDG_CACHE_HOME/Mindless Attractor/models/` or `~/.cache/Mindless Attractor/models/`
/// - Windows: `%LOCALAPPDATA%/Mindless Attractor/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    let base = dirs::data_dir();
    #[cfg(not(target_os = "macos"))]
    let base = dirs::cache_dir();

    base.map(|d| d.join("Mindless Attractor").join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let download_err = |source| ModelResolveError::Download {
        url: url.to_string(),
        source,
    };

    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(download_err)?;
    let total = response.content_length().unwrap_or(0);
    let bytes = response.bytes().map_err(download_err)?;

    // Write to a temp file first, then rename
    let temp_path = dest.with_extension("part");
    let write_err = |source| ModelResolveError::Write {
        path: temp_path.clone(),
        source,
    };
    let mut file = fs::File::create(&temp_path).map_err(write_err)?;

    let mut downloaded: u64 = 0;
    for chunk in bytes.chunks(1024 * 1024) {
        file.write_all(chunk).map_err(write_err)?;
        downloaded += chunk.len() as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }
    file.flush().map_err(write_err)?;
    drop(file);

    fs::rename(&temp_path, dest).map_err(|e| ModelResolveError::Write {
        path: dest.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const NAME: &str = "face_landmark.onnx";

    #[test]
    fn test_explicit_path_wins() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.onnx");
        fs::write(&path, b"model").unwrap();
        let lookup = ModelLookup {
            explicit: Some(&path),
            ..Default::default()
        };
        assert_eq!(resolve(NAME, &lookup, None).unwrap(), path);
    }

    #[test]
    fn test_missing_explicit_path_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nope.onnx");
        let lookup = ModelLookup {
            explicit: Some(&path),
            ..Default::default()
        };
        assert!(matches!(
            resolve(NAME, &lookup, None),
            Err(ModelResolveError::MissingExplicit(p)) if p == path
        ));
    }

    #[test]
    fn test_cache_checked_before_bundled() {
        let tmp = TempDir::new().unwrap();
        let cache = tmp.path().join("cache");
        let bundled = tmp.path().join("bundled");
        fs::create_dir_all(&cache).unwrap();
        fs::create_dir_all(&bundled).unwrap();
        fs::write(cache.join(NAME), b"cached").unwrap();
        fs::write(bundled.join(NAME), b"bundled").unwrap();

        let lookup = ModelLookup {
            bundled_dir: Some(&bundled),
            ..Default::default()
        };
        assert_eq!(
            resolve_in(&cache, NAME, &lookup, None).unwrap(),
            cache.join(NAME)
        );
    }

    #[test]
    fn test_falls_back_to_bundled() {
        let tmp = TempDir::new().unwrap();
        let bundled = tmp.path().join("bundled");
        fs::create_dir_all(&bundled).unwrap();
        fs::write(bundled.join(NAME), b"bundled").unwrap();

        let lookup = ModelLookup {
            bundled_dir: Some(&bundled),
            ..Default::default()
        };
        let found = resolve_in(&tmp.path().join("cache"), NAME, &lookup, None).unwrap();
        assert_eq!(found, bundled.join(NAME));
    }

    #[test]
    fn test_not_found_without_url_lists_searched_paths() {
        let tmp = TempDir::new().unwrap();
        let cache = tmp.path().join("cache");
        let err = resolve_in(&cache, NAME, &ModelLookup::default(), None).unwrap_err();
        match err {
            ModelResolveError::NotFound { name, searched } => {
                assert_eq!(name, NAME);
                assert_eq!(searched, vec![cache.join(NAME)]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!cache.exists());
    }

    #[test]
    fn test_model_cache_dir_returns_path() {
        let path = model_cache_dir().unwrap();
        assert!(path.to_string_lossy().contains("Mindless Attractor"));
        assert!(path.ends_with("models"));
    }

    #[test]
    fn test_download_invalid_url_leaves_no_partial_file() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.onnx");
        let result = download("http://invalid.nonexistent.example.com/model", &dest, None);
        assert!(result.is_err());
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }
}
