use crate::models::UploadRequest;
use crate::{Error, Result};
use reqwest::multipart::{Form, Part};

pub const TEXT_FIELD: &str = "text";
pub const IMAGE_FIELD: &str = "image";

#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Transport-neutral multipart body: parts are kept in send order.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadForm {
    parts: Vec<FormPart>,
}

impl UploadForm {
    /// Read the image fully and lay out the `text` and `image` parts.
    pub async fn from_request(request: &UploadRequest) -> Result<Self> {
        let image = request.image();
        let bytes = image.read_bytes().await?;

        tracing::debug!(
            "Built form for upload {}: {} byte image '{}' ({})",
            request.id(),
            bytes.len(),
            image.filename(),
            image.content_type()
        );

        Ok(Self {
            parts: vec![
                FormPart {
                    name: TEXT_FIELD.to_string(),
                    filename: None,
                    content_type: "text/plain".to_string(),
                    body: request.message().as_bytes().to_vec(),
                },
                FormPart {
                    name: IMAGE_FIELD.to_string(),
                    filename: Some(image.filename().to_string()),
                    content_type: image.content_type().to_string(),
                    body: bytes,
                },
            ],
        })
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    pub fn part(&self, name: &str) -> Option<&FormPart> {
        self.parts.iter().find(|part| part.name == name)
    }

    pub fn into_multipart(self) -> Result<Form> {
        let mut form = Form::new();
        for part in self.parts {
            let mut body = Part::bytes(part.body)
                .mime_str(&part.content_type)
                .map_err(|e| {
                    Error::Transport(format!(
                        "Invalid content type '{}' for part '{}': {}",
                        part.content_type, part.name, e
                    ))
                })?;
            if let Some(filename) = part.filename {
                body = body.file_name(filename);
            }
            form = form.part(part.name, body);
        }
        Ok(form)
    }
}
