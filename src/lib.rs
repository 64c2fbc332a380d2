// Library surface for the binary, headless/integration tests and reuse.
pub mod analysis;
pub mod app_dirs;
pub mod config;
pub mod driver;
pub mod error;
pub mod export;
pub mod host;
pub mod pacing;
pub mod runtime;
pub mod session;
pub mod store;
pub mod ui;
pub mod util;

pub use error::{HelmError, PersistenceError};
pub use session::{SampleEvent, SessionRecord, SessionTracker};
