//! fanin-rust
//!
//! Capa de aplicación sobre `fanin-core`:
//! - `config`: configuración global (`CONFIG`) desde variables de entorno.
//! - `snapshot`: carga de configuración + historial desde JSON.
//! - `errors`: errores de la aplicación.
//!
//! La usa el binario `fanin-inspect`.

pub mod config;
pub mod errors;
pub mod snapshot;

pub use config::{AppConfig, CONFIG};
pub use errors::AppError;
pub use snapshot::{Snapshot, SnapshotService};
