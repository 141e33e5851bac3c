//! Page handlers, one module per area of the site.

pub mod auth;
pub mod home;
pub mod overview;
pub mod patients;

use std::sync::Arc;

use crate::core_state::{CoreError, CoreState};
use crate::web::error::WebError;

/// Run database and password-hashing work off the async executor.
pub(crate) async fn blocking<T, F>(core: &Arc<CoreState>, work: F) -> Result<T, WebError>
where
    T: Send + 'static,
    F: FnOnce(&CoreState) -> Result<T, CoreError> + Send + 'static,
{
    let core = Arc::clone(core);
    tokio::task::spawn_blocking(move || work(&core))
        .await
        .map_err(|e| WebError::Internal(format!("blocking task failed: {e}")))?
        .map_err(WebError::from)
}
