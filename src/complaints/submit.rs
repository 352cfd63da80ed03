//! Multipart bodies for creating and editing complaints.

use reqwest::multipart::{Form, Part};
use std::path::Path;

use crate::error::ClientError;
use crate::models::ComplaintAction;

/// Multipart field carrying attached images. Repeated once per file.
pub const IMAGES_FIELD: &str = "images";

/// A file selected for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Attachment {
    /// Attachment with a content type guessed from the file name.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    /// Read a file from disk.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                ClientError::InvalidInput(format!("not a file path: {}", path.display()))
            })?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(file_name, bytes))
    }

    fn to_part(&self) -> Result<Part, ClientError> {
        Part::bytes(self.bytes.clone())
            .file_name(self.file_name.clone())
            .mime_str(&self.content_type)
            .map_err(|e| {
                ClientError::InvalidInput(format!(
                    "invalid content type {} for {}: {}",
                    self.content_type, self.file_name, e
                ))
            })
    }
}

/// Contents of the "new complaint" form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewComplaint {
    pub title: String,
    pub description: String,
    pub images: Vec<Attachment>,
}

impl NewComplaint {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            images: Vec::new(),
        }
    }

    pub fn with_image(mut self, attachment: Attachment) -> Self {
        self.images.push(attachment);
        self
    }

    pub(crate) fn to_form(&self) -> Result<Form, ClientError> {
        let mut form = Form::new()
            .text("title", self.title.clone())
            .text("description", self.description.clone());
        for image in &self.images {
            form = form.part(IMAGES_FIELD, image.to_part()?);
        }
        Ok(form)
    }
}

/// Fields of a complaint edit. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplaintUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub action: Option<ComplaintAction>,
    /// Attachment references to delete
    pub remove_images: Vec<String>,
    pub images: Vec<Attachment>,
}

impl ComplaintUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.action.is_none()
            && self.remove_images.is_empty()
            && self.images.is_empty()
    }

    pub(crate) fn to_form(&self) -> Result<Form, ClientError> {
        let mut form = Form::new();
        if let Some(title) = &self.title {
            form = form.text("title", title.clone());
        }
        if let Some(description) = &self.description {
            form = form.text("description", description.clone());
        }
        if let Some(action) = self.action {
            form = form.text("action", action.as_str());
        }
        for reference in &self.remove_images {
            form = form.text("remove_images", reference.clone());
        }
        for image in &self.images {
            form = form.part(IMAGES_FIELD, image.to_part()?);
        }
        Ok(form)
    }
}
