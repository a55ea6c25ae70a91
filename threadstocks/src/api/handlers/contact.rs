use axum::{Json, extract::State};

use crate::{
    AppState,
    api::{
        models::{auth::AuthSuccessResponse, contact::ContactRequest},
        payload::Payload,
    },
    errors::Result,
    notifications::EmailJob,
};

/// Forward a visitor's message to the site's contact mailbox
///
/// Delivery happens in the background; a failed send is logged, not reported.
#[utoipa::path(
    post,
    path = "/contact",
    request_body(
        content = ContactRequest,
        content_type = "application/json",
        description = "Also accepted as multipart/form-data, with an optional `attachment` file"
    ),
    tag = "contact",
    responses(
        (status = 200, description = "Message accepted", body = AuthSuccessResponse),
        (status = 400, description = "Missing or empty fields"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn send_contact_message(
    State(state): State<AppState>,
    Payload(request): Payload<ContactRequest>,
) -> Result<Json<AuthSuccessResponse>> {
    request.validate()?;

    if let Some(attachment) = &request.attachment {
        tracing::debug!(size = attachment.len(), "Contact message has an attachment");
    }
    state.emails.enqueue(EmailJob::Contact(request.into()));

    Ok(Json(AuthSuccessResponse::new("Your message has been sent")))
}
