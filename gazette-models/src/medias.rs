use crate::{config::CONFIG, schema::medias, Connection, Error, Result};
use diesel::prelude::*;
use guid_create::GUID;
use serde::Serialize;
use std::{
    fs::{self, DirBuilder},
    path::{Path, PathBuf},
};
use tracing::warn;

const ALLOWED_IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

#[derive(Clone, Queryable, Identifiable, Serialize)]
pub struct Media {
    pub id: i32,
    pub file_path: String,
    pub alt_text: String,
    pub owner_id: i32,
}

#[derive(Insertable)]
#[diesel(table_name = medias)]
pub struct NewMedia {
    pub file_path: String,
    pub alt_text: String,
    pub owner_id: i32,
}

impl Media {
    insert!(medias, NewMedia);
    get!(medias);
    find_by!(medias, find_by_file_path, file_path as &str);
    list_by!(medias, for_owner, owner_id as i32);

    pub fn is_image_extension(ext: &str) -> bool {
        ALLOWED_IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }

    /// Reserves a fresh path in the media directory for an upload.
    ///
    /// Fails with `Error::InvalidValue` when the extension is not one of
    /// the accepted image types.
    pub fn build_path(ext: &str) -> Result<PathBuf> {
        if !Media::is_image_extension(ext) {
            return Err(Error::InvalidValue);
        }
        DirBuilder::new()
            .recursive(true)
            .create(&CONFIG.media_directory)?;
        Ok(Path::new(&CONFIG.media_directory)
            .join(format!("{}.{}", GUID::rand(), ext.to_lowercase())))
    }

    /// File name relative to the media directory, which is also the last
    /// segment of the public URL.
    pub fn file_name(&self) -> String {
        Path::new(&self.file_path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn url(&self) -> String {
        format!("/media/{}", self.file_name())
    }

    pub fn delete(&self, conn: &mut Connection) -> Result<()> {
        if let Err(err) = fs::remove_file(&self.file_path) {
            warn!("couldn't delete media file {}: {}", self.file_path, err);
        }
        diesel::delete(self)
            .execute(conn)
            .map(|_| ())
            .map_err(Error::from)
    }
}
