mod encoder;
mod error;
mod service;
mod writer;

pub mod epgdat;

pub use encoder::{
    EncodeStats, EpgDatEncoder, EpgWriterConfig, LogCallback, Progress, ProgressCallback,
};
pub use error::Error;
pub use service::{EpgEvent, EpgService};
pub use writer::{EpgWriter, WriteReport};
