//! docqa core library
//!
//! Foundations shared by every docqa crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration (`Settings`)
//! - Provider names, the capability registry and fallback diagnostics

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod provider;

// Re-export commonly used types
pub use config::Settings;
pub use diagnostics::ProviderDiagnostics;
pub use error::{AppError, AppResult};
pub use provider::{ProviderKind, ProviderRegistry};
