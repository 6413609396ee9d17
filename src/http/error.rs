use rouille::Response;

use crate::storage::error::StorageError;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(path) => {
                ApiError::NotFound(format!("{} not found", path.to_string_lossy()))
            }

            StorageError::Decode { path, source } => {
                log::error!("failed to decode {}: {source}", path.to_string_lossy());
                ApiError::Internal(format!("{} is not a valid playlist", path.to_string_lossy()))
            }

            StorageError::Fs(err) if err.kind() == std::io::ErrorKind::NotFound => {
                ApiError::NotFound("not found".into())
            }

            StorageError::Database(_)
            | StorageError::Fs(_)
            | StorageError::Encode(_)
            | StorageError::Internal(_) => ApiError::Internal("internal server error".into()),
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::BadRequest(_) => 400,
            ApiError::Internal(_) => 500,
        }
    }

    pub fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) | ApiError::Internal(msg) => {
                Response::text(msg).with_status_code(status)
            }
        }
    }
}
