use crate::context::Interrupted;
use crate::model::company::CompanyId;
use crate::model::profile::UserId;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Caller-facing classification of a service failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A store call failed; not retried automatically.
    StoreUnavailable,
    /// Referenced company or profile is missing.
    NotFound,
    /// Caller supplied an unusable value.
    InvalidInput,
    /// Call was cancelled or exceeded its deadline; nothing was applied.
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StoreUnavailable => "store_unavailable",
            Self::NotFound => "not_found",
            Self::InvalidInput => "invalid_input",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Errors from company identity services.
#[derive(Debug)]
pub enum ServiceError {
    /// Referenced company does not exist.
    CompanyNotFound(CompanyId),
    /// Referenced profile does not exist.
    ProfileNotFound(UserId),
    /// Caller input is blank or otherwise unusable.
    InvalidInput(String),
    /// Context was cancelled or its deadline passed.
    Cancelled(Interrupted),
    /// Repository-level failure.
    Store(RepoError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CompanyNotFound(_) | Self::ProfileNotFound(_) => ErrorKind::NotFound,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Cancelled(_) => ErrorKind::Cancelled,
            Self::Store(_) => ErrorKind::StoreUnavailable,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CompanyNotFound(id) => write!(f, "company not found: {id}"),
            Self::ProfileNotFound(id) => write!(f, "profile not found: {id}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::Cancelled(reason) => write!(f, "{reason}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Cancelled(reason) => Some(reason),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Interrupted(reason) => Self::Cancelled(reason),
            other => Self::Store(other),
        }
    }
}

impl From<Interrupted> for ServiceError {
    fn from(value: Interrupted) -> Self {
        Self::Cancelled(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, ServiceError};
    use crate::context::Interrupted;
    use crate::repo::RepoError;

    #[test]
    fn interrupted_repo_errors_map_to_cancelled() {
        let err = ServiceError::from(RepoError::Interrupted(Interrupted::DeadlineExceeded));
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn other_repo_errors_map_to_store_unavailable() {
        let err = ServiceError::from(RepoError::MissingRequiredTable("companies"));
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
        assert_eq!(err.kind().as_str(), "store_unavailable");
    }
}
