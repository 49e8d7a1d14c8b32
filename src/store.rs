use bincode::{deserialize_from, serialize_into};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

use crate::color::Filter;
use crate::error::{PixelError, Result};
use crate::image::Image;

const GALLERY_FILE: &str = "images.bin.gz";

/// Writes the whole gallery as gzip-compressed bincode.
///
/// The data goes to a temporary file next to `filename` that is renamed
/// over it once complete, so readers never see a partial gallery.
pub fn save_gallery(images: &[Image], filename: impl AsRef<Path>) -> std::io::Result<()> {
    let filename = filename.as_ref();
    let dir = filename
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file = NamedTempFile::new_in(dir)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut writer = std::io::BufWriter::new(encoder);

    serialize_into(&mut writer, images)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    let encoder = writer.into_inner().map_err(|e| e.into_error())?;
    let mut file = encoder.finish()?;
    file.flush()?;
    file.persist(filename).map_err(|e| e.error)?;
    Ok(())
}

pub fn load_gallery(filename: impl AsRef<Path>) -> std::io::Result<Vec<Image>> {
    let file = File::open(filename)?;
    let decoder = GzDecoder::new(file);
    let mut reader = std::io::BufReader::new(decoder);

    let images: Vec<Image> = deserialize_from(&mut reader)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    Ok(images)
}

/// Number of images a user owns, as reported by the gallery statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserCount {
    pub user_id: String,
    pub count: usize,
}

/// Outcome of filtering a stored image.
#[derive(Debug, Clone)]
pub struct Transformed {
    pub original: Image,
    pub transformed: Image,
}

/// File-backed gallery of pixel-art images.
///
/// Every call reads the gallery file fresh. Changes hold `writer` from the
/// read to the rename of the new file, so concurrent adds through one store
/// are serialized and never reuse an id.
#[derive(Debug)]
pub struct ImageStore {
    path: PathBuf,
    writer: Mutex<()>,
}

impl ImageStore {
    /// Opens the gallery under `database_dir`, creating an empty one if needed.
    pub fn open(database_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = database_dir.as_ref();
        create_dir_all(dir)?;
        let path = dir.join(GALLERY_FILE);
        if !path.exists() {
            save_gallery(&[], &path)?;
            info!("created empty gallery at {}", path.display());
        }
        Ok(ImageStore {
            path,
            writer: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn all_images(&self) -> Result<Vec<Image>> {
        load_gallery(&self.path).map_err(|e| PixelError::store(format!("reading gallery: {}", e)))
    }

    pub fn images_by_user(&self, user_id: &str) -> Result<Vec<Image>> {
        Ok(self
            .all_images()?
            .into_iter()
            .filter(|image| image.user_id == user_id)
            .collect())
    }

    pub fn get(&self, image_id: &str) -> Result<Image> {
        self.all_images()?
            .into_iter()
            .find(|image| image.id.as_deref() == Some(image_id))
            .ok_or_else(|| PixelError::not_found(image_id))
    }

    /// Saves `image`, assigning the next id when it has none.
    ///
    /// Returns the id the image was stored under. An explicit id that is
    /// already taken is rejected.
    pub fn add_image(&self, image: Image) -> Result<String> {
        let _guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let mut images = self.all_images()?;
        let id = push_image(&mut images, image)?;
        self.write(&images)?;
        Ok(id)
    }

    /// Stores a filtered copy of an unedited image and returns both.
    pub fn transform(&self, image_id: &str, filter: Filter) -> Result<Transformed> {
        let _guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let mut images = self.all_images()?;

        let original = images
            .iter()
            .find(|image| image.id.as_deref() == Some(image_id))
            .cloned()
            .ok_or_else(|| PixelError::not_found(image_id))?;
        if original.edited {
            return Err(PixelError::AlreadyEdited {
                id: image_id.to_string(),
            });
        }

        let mut transformed = original.apply_filter(filter)?;
        let id = push_image(&mut images, transformed.clone())?;
        self.write(&images)?;
        transformed.id = Some(id);
        info!(
            "applied {} to image {} as {}",
            filter.name(),
            image_id,
            transformed.id.as_deref().unwrap_or_default()
        );

        Ok(Transformed {
            original,
            transformed,
        })
    }

    /// The `limit` users with the most images, most prolific first.
    pub fn top_users(&self, limit: usize) -> Result<Vec<UserCount>> {
        let images = self.all_images()?;
        let mut counts = count_by_user(images.iter());
        counts.truncate(limit);
        Ok(counts)
    }

    /// Edited images per user, highest count first; users without edits are left out.
    pub fn edited_counts(&self) -> Result<Vec<UserCount>> {
        let images = self.all_images()?;
        Ok(count_by_user(images.iter().filter(|image| image.edited)))
    }

    fn write(&self, images: &[Image]) -> Result<()> {
        save_gallery(images, &self.path)
            .map_err(|e| PixelError::store(format!("writing gallery: {}", e)))
    }
}

// Appends `image` under its own id, or the next free one when it has none.
fn push_image(images: &mut Vec<Image>, mut image: Image) -> Result<String> {
    let id = match image.id.take() {
        Some(id) => {
            if images.iter().any(|other| other.id.as_deref() == Some(&id)) {
                return Err(PixelError::store(format!("image {} already exists", id)));
            }
            id
        }
        None => next_id(images),
    };
    image.id = Some(id.clone());

    debug!(
        "storing image {} ({} pixels) for {}",
        id,
        image.pixels.len(),
        image.user_id
    );
    images.push(image);
    Ok(id)
}

// Counts per user, sorted by count descending and then by user id.
fn count_by_user<'a>(images: impl Iterator<Item = &'a Image>) -> Vec<UserCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for image in images {
        *counts.entry(image.user_id.as_str()).or_default() += 1;
    }
    let mut counts: Vec<UserCount> = counts
        .into_iter()
        .map(|(user_id, count)| UserCount {
            user_id: user_id.to_string(),
            count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Next id as `max + 1`, zero-padded to four digits.
fn next_id(images: &[Image]) -> String {
    let max = images
        .iter()
        .filter_map(|image| image.id.as_deref())
        .filter_map(|id| id.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("{:04}", max + 1)
}
