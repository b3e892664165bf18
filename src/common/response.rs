// src/common/response.rs

use serde::Serialize;

// Envelope de sucesso: { success: true, message?, data? }
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self { success: true, message: None, data: Some(data) }
    }

    pub fn with_message(message: String, data: T) -> Self {
        Self { success: true, message: Some(message), data: Some(data) }
    }
}

impl ApiResponse<()> {
    pub fn message(message: String) -> Self {
        Self { success: true, message: Some(message), data: None }
    }
}
