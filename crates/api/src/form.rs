//! Multipart form parsing for music uploads.
//!
//! Music create/update/upload requests are `multipart/form-data` carrying
//! text fields plus up to two files (`file` for audio, `thumbnail` for the
//! cover image). The whole form is buffered before any validation so that
//! nothing is written to the asset store for a request that will be rejected.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::Multipart;
use soundvault_core::music::{is_blank, FIELD_FILE, FIELD_THUMBNAIL};

use crate::error::{AppError, AppResult};

/// A file part from the form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied filename; used only for its extension.
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

/// A fully buffered music form.
#[derive(Debug, Default)]
pub struct MusicForm {
    text: HashMap<String, String>,
    pub file: Option<UploadedFile>,
    pub thumbnail: Option<UploadedFile>,
}

impl MusicForm {
    /// Drain `multipart` into memory.
    ///
    /// Empty file parts count as absent. Repeated text fields keep the last
    /// value.
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = MusicForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                FIELD_FILE | FIELD_THUMBNAIL => {
                    let file_name = field.file_name().map(str::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    if bytes.is_empty() {
                        continue;
                    }
                    let upload = UploadedFile { file_name, bytes };
                    if name == FIELD_FILE {
                        form.file = Some(upload);
                    } else {
                        form.thumbnail = Some(upload);
                    }
                }
                "" => {}
                _ => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    form.text.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    /// Raw value of a text field, if it was sent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.text.get(name).map(String::as_str)
    }

    /// Trimmed value of a text field, or `None` if absent or blank.
    pub fn non_blank(&self, name: &str) -> Option<&str> {
        self.text(name).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Whether a required field is present: files must be non-empty, text
    /// must be non-blank.
    pub fn has(&self, name: &str) -> bool {
        match name {
            FIELD_FILE => self.file.is_some(),
            FIELD_THUMBNAIL => self.thumbnail.is_some(),
            _ => !is_blank(self.text(name)),
        }
    }

    #[cfg(test)]
    fn with_text(mut self, name: &str, value: &str) -> Self {
        self.text.insert(name.to_string(), value.to_string());
        self
    }
}
