//! Mediapress engine: encoders, worker pool and delivery.
mod archive;
mod encode;
mod engine;
mod filename;
mod intake;
mod persist;
mod types;

pub use archive::{build_archive, deliver_outputs, ArchiveOptions, DeliverError, DeliverySummary};
pub use encode::{ChannelProgressSink, Encoder, ProgressSink, WebmEncoder, WebpEncoder};
pub use engine::{EngineConfig, EngineEvents, EngineHandle, ProgressMode};
pub use filename::{derived_name, unique_names};
pub use intake::{screen_files, IntakeError, RejectedFile};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use types::{
    Artifact, CapabilityError, ConversionError, EngineEvent, JobId, JobProgress, MediaKind,
    SourceFile, Stage,
};
