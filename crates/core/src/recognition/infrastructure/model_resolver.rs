use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
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

/// Locate a model file, downloading it into the cache on first use.
///
/// Lookup order: `model_dir` (when given), then the user cache directory,
/// then a download from `url` into the cache.
pub fn resolve(
    name: &str,
    url: &str,
    model_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    resolve_in(&model_cache_dir()?, name, url, model_dir, progress)
}

fn resolve_in(
    cache_dir: &Path,
    name: &str,
    url: &str,
    model_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    if let Some(path) = model_dir.map(|dir| dir.join(name)).filter(|p| p.exists()) {
        return Ok(path);
    }

    let cached_path = cache_dir.join(name);
    if cached_path.exists() {
        return Ok(cached_path);
    }

    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    log::info!("Downloading {name} from {url}");
    download(url, &cached_path, progress)?;
    Ok(cached_path)
}

/// `Aura/models` under the platform cache directory (application data on macOS).
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    let base = dirs::data_dir();
    #[cfg(not(target_os = "macos"))]
    let base = dirs::cache_dir();
    base.map(|d| d.join("Aura").join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

/// Downloads to `<dest>.part` and renames on success, so an interrupted
/// download never leaves a truncated model at `dest`.
fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let temp_path = dest.with_extension("part");
    let result = download_to(url, &temp_path, progress).and_then(|()| {
        fs::rename(&temp_path, dest).map_err(|source| ModelResolveError::Write {
            path: dest.to_path_buf(),
            source,
        })
    });
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn download_to(
    url: &str,
    temp_path: &Path,
    progress: Option<ProgressFn>,
) -> Result<(), ModelResolveError> {
    let write_err = |source: io::Error| ModelResolveError::Write {
        path: temp_path.to_path_buf(),
        source,
    };

    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|source| ModelResolveError::Download {
            url: url.to_string(),
            source,
        })?;

    let file = fs::File::create(temp_path).map_err(write_err)?;
    let mut writer = ProgressWriter {
        inner: io::BufWriter::new(file),
        written: 0,
        total: response.content_length().unwrap_or(0),
        progress,
    };
    io::copy(&mut response, &mut writer).map_err(write_err)?;
    writer.flush().map_err(write_err)
}

struct ProgressWriter<W: Write> {
    inner: W,
    written: u64,
    total: u64,
    progress: Option<ProgressFn>,
}

impl<W: Write> Write for ProgressWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        if let Some(ref cb) = self.progress {
            cb(self.written, self.total);
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Serves one HTTP response and returns the URL to fetch it from.
    fn serve_once(status: &'static str, body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf);
                let header = format!(
                    "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(header.as_bytes());
                let _ = stream.write_all(body);
            }
        });
        format!("http://{addr}/model.onnx")
    }

    #[test]
    fn test_model_dir_takes_precedence() {
        let tmp = TempDir::new().unwrap();
        let model_dir = tmp.path().join("models");
        let cache_dir = tmp.path().join("cache");
        fs::create_dir_all(&model_dir).unwrap();
        fs::create_dir_all(&cache_dir).unwrap();
        fs::write(model_dir.join("face.onnx"), b"local").unwrap();
        fs::write(cache_dir.join("face.onnx"), b"cached").unwrap();

        let path = resolve_in(
            &cache_dir,
            "face.onnx",
            "http://invalid.example.com/face.onnx",
            Some(&model_dir),
            None,
        )
        .unwrap();
        assert_eq!(path, model_dir.join("face.onnx"));
    }

    #[test]
    fn test_cached_file_is_used_without_download() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("face.onnx"), b"cached").unwrap();

        let path = resolve_in(
            tmp.path(),
            "face.onnx",
            "http://invalid.nonexistent.example.com/face.onnx",
            None,
            None,
        )
        .unwrap();
        assert_eq!(fs::read(path).unwrap(), b"cached");
    }

    #[test]
    fn test_missing_model_is_downloaded_into_cache() {
        let tmp = TempDir::new().unwrap();
        let cache_dir = tmp.path().join("cache");
        let url = serve_once("200 OK", b"model bytes");

        let called = Arc::new(AtomicBool::new(false));
        let flag = called.clone();
        let path = resolve_in(
            &cache_dir,
            "face.onnx",
            &url,
            None,
            Some(Box::new(move |done, total| {
                assert!(done <= total);
                flag.store(true, Ordering::Relaxed);
            })),
        )
        .unwrap();

        assert_eq!(path, cache_dir.join("face.onnx"));
        assert_eq!(fs::read(&path).unwrap(), b"model bytes");
        assert!(called.load(Ordering::Relaxed));
    }

    #[test]
    fn test_http_error_leaves_no_partial_file() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("face.onnx");
        let url = serve_once("404 Not Found", b"");

        let result = download(&url, &dest, None);
        assert!(matches!(result, Err(ModelResolveError::Download { .. })));
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }

    #[test]
    fn test_model_cache_dir_returns_path() {
        let path = model_cache_dir().unwrap();
        assert!(path.to_string_lossy().contains("Aura"));
        assert!(path.ends_with("models"));
    }
}
