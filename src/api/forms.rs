//! Multipart form collection for the endpoints that accept images.

use axum::extract::Multipart;
use std::collections::HashMap;

use super::ApiError;
use crate::services::Upload;

/// Text fields plus at most one file field from a multipart body.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, Vec<String>>,
    pub file: Option<Upload>,
}

impl FormData {
    /// Reads every part; the part named `file_field` becomes [`FormData::file`].
    pub async fn collect(mut multipart: Multipart, file_field: &str) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::validation(format!("Malformed multipart body: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if name == file_field {
                let extension = extension_for(field.file_name(), field.content_type())?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(format!("Failed to read upload: {e}")))?;
                if bytes.is_empty() {
                    continue;
                }
                form.file = Some(Upload {
                    bytes: bytes.to_vec(),
                    extension,
                });
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::validation(format!("Invalid field {name}: {e}")))?;
                form.fields.entry(name).or_default().push(value);
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn required(&self, name: &str) -> Result<&str, ApiError> {
        self.text(name)
            .ok_or_else(|| ApiError::validation(format!("Missing field: {name}")))
    }

    /// Every value of a repeatable field, with comma-separated values split.
    pub fn list(&self, name: &str) -> Option<Vec<String>> {
        self.fields.get(name).map(|values| {
            values
                .iter()
                .flat_map(|v| v.split(','))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}

fn extension_for(file_name: Option<&str>, content_type: Option<&str>) -> Result<String, ApiError> {
    if let Some(content_type) = content_type
        && !content_type.starts_with("image/")
    {
        return Err(ApiError::validation(format!(
            "Unsupported upload type: {content_type}"
        )));
    }

    let from_name = file_name
        .and_then(|name| std::path::Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            mime_guess::from_ext(ext)
                .first()
                .is_some_and(|mime| mime.type_() == mime_guess::mime::IMAGE)
        })
        .map(str::to_ascii_lowercase);

    let from_type = content_type
        .and_then(mime_guess::get_mime_extensions_str)
        .and_then(|exts| exts.first())
        .map(|ext| (*ext).to_string());

    from_name
        .or(from_type)
        .ok_or_else(|| ApiError::validation("Upload must be an image"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for(Some("cat.PNG"), None).unwrap(), "png");
        assert!(!extension_for(Some("blob"), Some("image/jpeg")).unwrap().is_empty());
        assert!(extension_for(Some("notes.txt"), Some("text/plain")).is_err());
        assert!(extension_for(Some("notes.txt"), None).is_err());
    }
}
