//! Request bodies that may arrive as JSON or as `multipart/form-data`.
//!
//! JSON bodies are deserialized with serde as usual. Multipart bodies are first collected into
//! [`FormFields`] and then mapped onto the target type by its [`FromForm`] implementation, so
//! every DTO that accepts form posts spells out which fields it reads and how they are typed.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{FromRequest, Multipart, Request},
    http::header,
};
use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::errors::Error;

/// A file part of a multipart body, held in memory
#[derive(Debug, Clone)]
pub struct FileAttachment {
    /// Name of the form field the file was sent under
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl FileAttachment {
    /// Client supplied file name, or a generic one when the client sent none
    pub fn file_name_or_default(&self) -> String {
        self.file_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("attachment")
            .to_string()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Decoded multipart form: text fields by name, plus any file parts
#[derive(Debug, Default)]
pub struct FormFields {
    text: HashMap<String, String>,
    files: Vec<FileAttachment>,
}

impl FormFields {
    /// Read every part of a multipart stream. A repeated text field keeps its last value.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, Error> {
        let mut fields = FormFields::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| Error::bad_request(format!("Failed to parse multipart data: {e}")))?
        {
            let name = field.name().unwrap_or("").to_string();

            if field.file_name().is_some() {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| Error::bad_request(format!("Failed to read file '{name}': {e}")))?;

                fields.files.push(FileAttachment {
                    field: name,
                    file_name,
                    content_type,
                    data,
                });
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| Error::bad_request(format!("Failed to read field '{name}': {e}")))?;
                fields.text.insert(name, value);
            }
        }

        Ok(fields)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.text.get(name).map(String::as_str)
    }

    /// Remove and return a text field, or fail naming the missing field
    pub fn required_text(&mut self, name: &str) -> Result<String, Error> {
        self.text
            .remove(name)
            .ok_or_else(|| Error::bad_request(format!("Missing field '{name}'")))
    }

    pub fn optional_text(&mut self, name: &str) -> Option<String> {
        self.text.remove(name)
    }

    /// Checkbox style boolean. An absent field is `None`.
    pub fn optional_bool(&self, name: &str) -> Result<Option<bool>, Error> {
        self.text(name)
            .map(|value| match value.trim().to_ascii_lowercase().as_str() {
                "true" | "on" | "1" | "yes" => Ok(true),
                "false" | "off" | "0" | "no" | "" => Ok(false),
                other => Err(Error::bad_request(format!("Field '{name}' is not a boolean: '{other}'"))),
            })
            .transpose()
    }

    pub fn optional_i64(&self, name: &str) -> Result<Option<i64>, Error> {
        self.text(name)
            .map(|value| {
                value
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| Error::bad_request(format!("Field '{name}' is not an integer: '{value}'")))
            })
            .transpose()
    }

    /// Remove and return the first file sent under `name`
    pub fn take_file(&mut self, name: &str) -> Option<FileAttachment> {
        let index = self.files.iter().position(|file| file.field == name)?;
        Some(self.files.remove(index))
    }
}

/// Explicit mapping from a decoded multipart form onto a request type
pub trait FromForm: Sized {
    fn from_form(fields: FormFields) -> Result<Self, Error>;
}

/// Extractor accepting either a JSON body or a multipart form for `T`.
///
/// Any content type other than `multipart/form-data` is handed to axum's [`Json`] extractor, so a
/// missing or unsupported content type is rejected as a bad request.
#[derive(Debug, Clone)]
pub struct Payload<T>(pub T);

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
}

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + FromForm,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_multipart(&req) {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| Error::bad_request(e.body_text()))?;
            let fields = FormFields::from_multipart(multipart).await?;
            return T::from_form(fields).map(Payload);
        }

        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| Error::bad_request(e.body_text()))?;
        Ok(Payload(value))
    }
}
