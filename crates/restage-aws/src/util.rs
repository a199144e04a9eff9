//! SDK error translation.

use aws_sdk_rds::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};

use restage_core::ControlPlaneError;

/// Error codes the provisioner treats as idempotent success.
const ALREADY_EXISTS_CODES: [&str; 2] = ["DBClusterAlreadyExistsFault", "DBInstanceAlreadyExists"];

pub(crate) fn api_error<E>(err: SdkError<E>) -> ControlPlaneError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    ControlPlaneError::Api(format!("{}", DisplayErrorContext(&err)))
}

/// Map a creation failure, folding "already exists" codes into
/// [`ControlPlaneError::AlreadyExists`].
pub(crate) fn creation_error<E>(resource: &str, err: SdkError<E>) -> ControlPlaneError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    match err.code() {
        Some(code) if ALREADY_EXISTS_CODES.contains(&code) => ControlPlaneError::AlreadyExists {
            resource: resource.to_string(),
        },
        _ => api_error(err),
    }
}
