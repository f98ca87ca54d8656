//! Mediapress core: pure batch state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{
    ArtifactMeta, Batch, BatchPhase, ConversionJob, DeliveryReport, IncomingFile, JobId, JobPhase,
    MediaKind,
};
pub use update::update;
pub use view_model::{AddStats, BatchViewModel, DownloadAffordance, JobRowView};
