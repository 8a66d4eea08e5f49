use thiserror::Error;

#[derive(Error, Debug)]
pub enum PacketFormError {
    #[error("Invalid base64 input: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    #[error("PDF operation failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Malformed form field {field}: {reason}")]
    Field { field: String, reason: String },

    #[error("Failed to save PDF: {0}")]
    Save(String),

    #[error("Invalid form profile: {0}")]
    Profile(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PacketFormError {
    pub(crate) fn field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PacketFormError::Field {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
