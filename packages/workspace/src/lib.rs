pub mod config;
pub mod error;
pub mod preview;

pub use config::{WorkspaceConfig, DEFAULT_CONFIG_NAME};
pub use error::{WorkspaceError, WorkspaceResult};
pub use preview::PreviewSession;
