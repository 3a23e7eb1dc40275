//! Query executor and backend transport
//!
//! The executor owns the per-target connection cache and runs every
//! transport call under the submission's cancellation token and the
//! configured timeout. The transport itself sits behind the
//! `Connector`/`Connection` traits; `HttpConnector` is the production
//! implementation, tests plug in their own.

pub mod error;
pub mod executor;
pub mod http;

pub use error::ExecutorError;
pub use executor::{Connection, Connector, QueryExecutor, QueryPage, RowStream};
pub use http::HttpConnector;
