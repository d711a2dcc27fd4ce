//! Library side of the `dpm` command line: logging setup and the build
//! pipeline stages.

pub mod logging;
pub mod pipeline;
pub mod types;
