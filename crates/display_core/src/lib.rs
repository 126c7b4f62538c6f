//! Display-side core: the view router and the connection to the controller.

pub mod backoff;
pub mod connection;
pub mod error;
pub mod router;

pub use backoff::BackoffPolicy;
pub use connection::{ConnectionManager, ConnectionStatus};
pub use error::ConnectionError;
pub use router::ViewRouter;
