pub mod compile;
pub mod demo;
pub mod init;
pub mod normalize;
pub mod theme;

pub use compile::{compile, CompileArgs};
pub use demo::{demo, DemoArgs};
pub use init::{init, InitArgs};
pub use normalize::{normalize, NormalizeArgs};
pub use theme::{theme, ThemeArgs};

/// Single-threaded runtime for commands that talk to a store
pub(crate) fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}
