//! Worker-side task execution.
//!
//! [`TaskExecutor`] is what a worker node calls for every dispatched request:
//! shell tasks go to [`ShellExecutor`], HTTP tasks to [`HttpExecutor`]. Both
//! honour a deadline and a [`CancellationToken`](tokio_util::sync::CancellationToken)
//! and always hand back whatever output was captured, even on failure.

mod error;
pub use error::ExecError;

mod config;
pub use config::{HttpConfig, OutputEncoding, ShellConfig};

mod encoding;
pub use encoding::decode_output;

mod html;
pub use html::clean_html_entities;

mod output;
pub use output::RunOutput;

mod util;
pub use util::default_work_dir;

pub mod shell;
pub use shell::ShellExecutor;

#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "http")]
pub use http::HttpExecutor;

#[cfg(feature = "http")]
mod runner;
#[cfg(feature = "http")]
pub use runner::TaskExecutor;

pub mod prelude {
    pub use crate::error::ExecError;
    pub use crate::output::RunOutput;
    pub use crate::shell::ShellExecutor;
    #[cfg(feature = "http")]
    pub use crate::{HttpExecutor, TaskExecutor};
}
