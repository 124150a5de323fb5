//! Generated QR code model

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Generated code entity, owned by exactly one user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GeneratedCode {
    pub id: Uuid,
    pub source_url: String,
    /// Self-describing `data:` URL holding the encoded image
    pub image_payload: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// New code creation payload
#[derive(Debug, Clone)]
pub struct NewCode {
    pub owner_id: Uuid,
    pub source_url: String,
    pub image_payload: ImagePayload,
}

/// Image bytes encoded as a `data:<mime>;base64,<body>` URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload(String);

impl ImagePayload {
    /// Encode raw image bytes of the given MIME type
    pub fn encode(mime: &str, bytes: &[u8]) -> Self {
        ImagePayload(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Form body for `POST /`
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitForm {
    #[serde(default)]
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_builds_data_url() {
        let payload = ImagePayload::encode("image/png", b"\x89PNG");
        assert_eq!(payload.as_str(), "data:image/png;base64,iVBORw==");
    }
}
