//! Email rendering and delivery for password resets and the contact form.

use lettre::{
    AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Attachment, Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::{path::Path, time::Duration};

use crate::{
    api::payload::FileAttachment,
    config::{Config, EmailTransportConfig, SmtpTls},
    errors::Error,
};

/// A contact form submission on its way to the site owner
#[derive(Debug, Clone)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub attachment: Option<FileAttachment>,
}

pub struct EmailService {
    transport: EmailTransport,
    from_email: String,
    from_name: String,
    contact_email: String,
    frontend_url: String,
    reset_token_lifetime: Duration,
}

enum EmailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

impl EmailService {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let email_config = &config.email;

        let transport = match &email_config.transport {
            EmailTransportConfig::Smtp {
                host,
                port,
                username,
                password,
                tls,
            } => {
                let builder = match tls {
                    SmtpTls::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(host),
                    SmtpTls::Starttls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host),
                    SmtpTls::None => {
                        tracing::warn!("SMTP TLS is disabled - this is not recommended for production");
                        Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host))
                    }
                }
                .map_err(|e| Error::Internal {
                    operation: format!("create SMTP transport: {e}"),
                })?
                .port(*port)
                .credentials(Credentials::new(username.clone(), password.clone()));

                EmailTransport::Smtp(builder.build())
            }
            EmailTransportConfig::File { path } => {
                let emails_dir = Path::new(path);
                if !emails_dir.exists() {
                    std::fs::create_dir_all(emails_dir).map_err(|e| Error::Internal {
                        operation: format!("create emails directory: {e}"),
                    })?;
                }
                EmailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(emails_dir))
            }
        };

        Ok(Self {
            transport,
            from_email: email_config.from_email.clone(),
            from_name: email_config.from_name.clone(),
            contact_email: email_config.contact_email.clone(),
            frontend_url: config.frontend_url.trim_end_matches('/').to_string(),
            reset_token_lifetime: config.auth.password_reset_token_duration,
        })
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/reset-password?token={}", self.frontend_url, token)
    }

    pub async fn send_password_reset_email(&self, to_email: &str, to_name: Option<&str>, token: &str) -> Result<(), Error> {
        let body = self.create_password_reset_body(to_name, &self.reset_link(token));
        let to = mailbox(to_name, to_email)?;

        self.send_email(to, None, "Password Reset Request", body, None).await
    }

    /// Forward a contact form submission to the configured contact mailbox, with the visitor as
    /// Reply-To.
    pub async fn send_contact_email(&self, contact: &ContactMessage) -> Result<(), Error> {
        let to = mailbox(None, &self.contact_email)?;
        let reply_to = mailbox(Some(&contact.name), &contact.email)?;
        let subject = format!("New contact message: {}", contact.subject);
        let body = create_contact_body(contact);

        self.send_email(to, Some(reply_to), &subject, body, contact.attachment.as_ref())
            .await
    }

    async fn send_email(
        &self,
        to: Mailbox,
        reply_to: Option<Mailbox>,
        subject: &str,
        body: String,
        attachment: Option<&FileAttachment>,
    ) -> Result<(), Error> {
        let from = mailbox(Some(&self.from_name), &self.from_email)?;

        let mut builder = Message::builder().from(from).to(to).subject(subject);
        if let Some(reply_to) = reply_to {
            builder = builder.reply_to(reply_to);
        }

        let message = match attachment {
            Some(file) => {
                let content_type = file
                    .content_type
                    .as_deref()
                    .and_then(|ct| ContentType::parse(ct).ok())
                    .map_or_else(|| ContentType::parse("application/octet-stream"), Ok)
                    .map_err(|e| Error::Internal {
                        operation: format!("parse attachment content type: {e}"),
                    })?;
                let attachment = Attachment::new(file.file_name_or_default()).body(file.data.to_vec(), content_type);

                builder.multipart(MultiPart::mixed().singlepart(SinglePart::html(body)).singlepart(attachment))
            }
            None => builder.header(ContentType::TEXT_HTML).body(body),
        }
        .map_err(|e| Error::Internal {
            operation: format!("build email message: {e}"),
        })?;

        match &self.transport {
            EmailTransport::Smtp(smtp) => {
                smtp.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send SMTP email: {e}"),
                })?;
            }
            EmailTransport::File(file) => {
                file.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send file email: {e}"),
                })?;
            }
        }

        Ok(())
    }

    fn create_password_reset_body(&self, to_name: Option<&str>, reset_link: &str) -> String {
        let greeting = match to_name {
            Some(name) => format!("Hello {},", escape_html(name)),
            None => "Hello,".to_string(),
        };
        let lifetime = humantime::format_duration(self.reset_token_lifetime);

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Password Reset Request</title>
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .footer {{ margin-top: 30px; font-size: 12px; color: #666; }}
    </style>
</head>
<body>
    <div class="container">
        <h2>Password Reset Request</h2>

        <p>{greeting}</p>

        <p>We received a request to reset your password. If you didn't make this request, you can safely ignore this email.</p>

        <p><a href="{reset_link}">Reset your password</a></p>

        <p>Or copy and paste this link into your browser:</p>
        <p>{reset_link}</p>

        <p>This link will expire in {lifetime}.</p>

        <div class="footer">
            <p>This is an automated message, please do not reply to this email.</p>
        </div>
    </div>
</body>
</html>"#
        )
    }
}

fn mailbox(name: Option<&str>, email: &str) -> Result<Mailbox, Error> {
    let address = email.parse().map_err(|e| Error::Internal {
        operation: format!("parse email address: {e}"),
    })?;
    Ok(Mailbox::new(name.map(str::to_string), address))
}

fn create_contact_body(contact: &ContactMessage) -> String {
    let message = escape_html(&contact.message).replace('\n', "<br>\n");
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Contact message</title></head>
<body>
    <h2>New contact message</h2>
    <p><strong>From:</strong> {name} &lt;{email}&gt;</p>
    <p><strong>Subject:</strong> {subject}</p>
    <p>{message}</p>
</body>
</html>"#,
        name = escape_html(&contact.name),
        email = escape_html(&contact.email),
        subject = escape_html(&contact.subject),
    )
}

/// Escape text for interpolation into an HTML body
fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_config, sent_emails};
    use bytes::Bytes;

    fn file_config(dir: &Path) -> Config {
        let mut config = create_test_config();
        config.email.transport = EmailTransportConfig::File {
            path: dir.to_string_lossy().to_string(),
        };
        config
    }

    #[tokio::test]
    async fn test_email_service_creation() {
        let dir = tempfile::tempdir().unwrap();
        assert!(EmailService::new(&file_config(dir.path())).is_ok());
    }

    #[tokio::test]
    async fn test_reset_link_uses_frontend_url() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = file_config(dir.path());
        config.frontend_url = "https://app.example.com/".to_string();
        let service = EmailService::new(&config).unwrap();

        assert_eq!(service.reset_link("abc123"), "https://app.example.com/reset-password?token=abc123");
    }

    #[tokio::test]
    async fn test_password_reset_email_body() {
        let dir = tempfile::tempdir().unwrap();
        let service = EmailService::new(&file_config(dir.path())).unwrap();

        let body = service.create_password_reset_body(Some("Jane <Doe>"), "https://example.com/reset?token=abc123");

        assert!(body.contains("Hello Jane &lt;Doe&gt;,"));
        assert!(body.contains("https://example.com/reset?token=abc123"));
        assert!(body.contains("expire in 1h"));
    }

    #[tokio::test]
    async fn test_password_reset_email_written_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let service = EmailService::new(&file_config(dir.path())).unwrap();

        service
            .send_password_reset_email("user@example.com", Some("user"), "deadbeef")
            .await
            .unwrap();

        let emails = sent_emails(dir.path());
        assert_eq!(emails.len(), 1);
        assert!(emails[0].contains("user@example.com"));
        assert!(emails[0].contains("Content-Transfer-Encoding: quoted-printable"));
        assert!(emails[0].contains("http://localhost:5173/reset-password?token=deadbeef"));
    }

    #[tokio::test]
    async fn test_contact_email_goes_to_contact_mailbox() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = file_config(dir.path());
        config.email.contact_email = "owner@example.com".to_string();
        let service = EmailService::new(&config).unwrap();

        let contact = ContactMessage {
            name: "Visitor".to_string(),
            email: "visitor@example.com".to_string(),
            subject: "Hello".to_string(),
            message: "<script>alert(1)</script>".to_string(),
            attachment: Some(FileAttachment {
                field: "attachment".to_string(),
                file_name: Some("notes.txt".to_string()),
                content_type: Some("text/plain".to_string()),
                data: Bytes::from_static(b"some notes"),
            }),
        };
        service.send_contact_email(&contact).await.unwrap();

        let emails = sent_emails(dir.path());
        assert_eq!(emails.len(), 1);
        assert!(emails[0].contains("To: owner@example.com"));
        assert!(emails[0].contains("Reply-To: \"Visitor\" <visitor@example.com>") || emails[0].contains("Reply-To: Visitor <visitor@example.com>"));
        assert!(emails[0].contains("Subject: New contact message: Hello"));
        assert!(emails[0].contains("notes.txt"));
        assert!(!emails[0].contains("<script>"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }
}
