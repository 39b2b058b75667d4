use serde::Serialize;

/// `{ "success": true, "data": ... }`
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// `{ "success": true, "content": "..." }`, used by free generation.
#[derive(Debug, Serialize)]
pub struct ContentResponse {
    pub success: bool,
    pub content: String,
}

impl ContentResponse {
    pub fn new(content: String) -> Self {
        Self {
            success: true,
            content,
        }
    }
}
