//! Contact form payload.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::payload::{FileAttachment, FormFields, FromForm},
    email::ContactMessage,
    errors::Error,
};

/// A visitor's message for the site owners. Multipart posts may add an `attachment` file.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    #[serde(skip)]
    #[schema(value_type = Option<String>, format = Binary)]
    pub attachment: Option<FileAttachment>,
}

impl ContactRequest {
    /// Every text field is required and must be non-blank, and `email` must be a mailbox address
    pub fn validate(&self) -> Result<(), Error> {
        for (name, value) in [
            ("name", &self.name),
            ("email", &self.email),
            ("subject", &self.subject),
            ("message", &self.message),
        ] {
            if value.trim().is_empty() {
                return Err(Error::bad_request(format!("Field '{name}' is required")));
            }
        }

        self.email
            .trim()
            .parse::<lettre::Address>()
            .map_err(|_| Error::bad_request(format!("Invalid email address '{}'", self.email.trim())))?;

        Ok(())
    }
}

impl FromForm for ContactRequest {
    fn from_form(mut fields: FormFields) -> Result<Self, Error> {
        Ok(Self {
            attachment: fields.take_file("attachment").filter(|file| !file.is_empty()),
            name: fields.required_text("name")?,
            email: fields.required_text("email")?,
            subject: fields.required_text("subject")?,
            message: fields.required_text("message")?,
        })
    }
}

impl From<ContactRequest> for ContactMessage {
    fn from(request: ContactRequest) -> Self {
        Self {
            name: request.name,
            email: request.email.trim().to_string(),
            subject: request.subject,
            message: request.message,
            attachment: request.attachment,
        }
    }
}
