use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::recognition::domain::face_encoder::FaceEncoder;
use crate::recognition::domain::roster::AuthorizedRoster;
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;

/// Separates an identity name from a per-image suffix in reference file stems.
const NAME_SUFFIX_SEPARATOR: &str = "__";

/// Startup failures. Any of these stops the process before the loops start.
#[derive(Error, Debug)]
pub enum RosterError {
    #[error("roster directory '{0}' not found")]
    MissingDirectory(PathBuf),
    #[error("failed to read roster directory '{path}': {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no reference images found in '{0}'")]
    NoReferenceImages(PathBuf),
    #[error("failed to decode reference image '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("face encoding failed for '{path}': {message}")]
    Encoder { path: PathBuf, message: String },
    #[error("no face found in reference image '{0}'")]
    NoFace(PathBuf),
}

/// Builds the authorized roster from a directory of reference images.
///
/// Each image contributes one embedding under the name taken from its file
/// stem (`Seeleal13.jpg` → `Seeleal13`). A `__suffix` on the stem lets
/// several images share an identity (`Seeleal13__side.jpg`).
pub fn load_roster(
    dir: &Path,
    encoder: &mut dyn FaceEncoder,
) -> Result<AuthorizedRoster, RosterError> {
    if !dir.is_dir() {
        return Err(RosterError::MissingDirectory(dir.to_path_buf()));
    }

    let images = reference_images(dir)?;
    if images.is_empty() {
        return Err(RosterError::NoReferenceImages(dir.to_path_buf()));
    }

    let mut roster = AuthorizedRoster::new();
    for path in images {
        let name = identity_name(&path);
        let image = image::open(&path)
            .map_err(|source| RosterError::Decode {
                path: path.clone(),
                source,
            })?
            .to_rgb8();
        let frame = Frame::from_rgb_image(image, 0);

        let faces = encoder.encode(&frame).map_err(|e| RosterError::Encoder {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let face_count = faces.len();
        let first = faces
            .into_iter()
            .next()
            .ok_or_else(|| RosterError::NoFace(path.clone()))?;
        if face_count > 1 {
            log::warn!(
                "{} faces in {}, using the first",
                face_count,
                path.display()
            );
        }

        log::info!("Loaded reference face '{name}' from {}", path.display());
        roster.add(&name, first.embedding);
    }

    Ok(roster)
}

fn reference_images(dir: &Path) -> Result<Vec<PathBuf>, RosterError> {
    let entries = fs::read_dir(dir).map_err(|source| RosterError::ReadDirectory {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut images: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_image(path))
        .collect();
    images.sort();
    Ok(images)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn identity_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    match stem.split_once(NAME_SUFFIX_SEPARATOR) {
        Some((name, _)) if !name.is_empty() => name.to_string(),
        _ => stem.to_string(),
    }
}
