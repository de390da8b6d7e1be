//! Pipeline components: channels, quiescence, stage runner, lister, archiver, orchestration.

pub mod archiver;
pub mod channel;
pub mod context;
pub mod lister;
pub mod orchestrator;
pub mod quiescence;
pub mod sequence;
pub mod stage;

pub use archiver::run_archiver;
pub use channel::{BoundedChannel, drain_until_quiescent};
pub use context::{Collaborators, PipelineChannels, create_pipeline_channels};
pub use lister::{run_lister, spawn_lister};
pub use orchestrator::run_pipeline;
pub use quiescence::{Quiescent, QuiescentFlag};
pub use sequence::SequenceAllocator;
pub use stage::{StageConfig, StageFn, StageHandle, StageRunner, StageState, drop_label};
