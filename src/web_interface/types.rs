use serde::Serialize;

use crate::storage::types::RecordId;

/// Error payload of every failed request
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error_message: String,
}

/// Body of a successful create
#[derive(Debug, Serialize)]
pub struct Created {
    pub id: RecordId,
}

/// Body of a successful update or delete
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}
