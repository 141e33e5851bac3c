//! Server-rendered HTML site.
//!
//! Staff register and log in, then list, add, edit and delete patients
//! and view the ward overview. Routes are protected by a middleware
//! stack: Session → Access log → Login guard → Handler.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;
pub mod views;

pub use error::WebError;
pub use router::web_router;
pub use server::{start_server, ServerError, WebServer};
pub use types::AppContext;
