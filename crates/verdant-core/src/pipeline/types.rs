use crate::index::{IndexKind, SceneMean};
use crate::scene::{GridSpec, SceneInfo};
use crate::season::{SeasonComposite, SeasonalComposites};

/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Searching,
    Stacking,
    Indexing,
    Aggregating,
    Writing,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Searching => write!(f, "Searching catalog"),
            Self::Stacking => write!(f, "Stacking bands"),
            Self::Indexing => write!(f, "Computing indices"),
            Self::Aggregating => write!(f, "Compositing seasons"),
            Self::Writing => write!(f, "Writing output"),
        }
    }
}

/// Results for one index.
#[derive(Clone, Debug)]
pub struct IndexOutput {
    pub composites: SeasonalComposites,
    pub scene_means: Vec<SceneMean>,
    /// Whole-range composite, when requested.
    pub temporal_mean: Option<SeasonComposite>,
}

#[derive(Clone, Debug)]
pub struct PipelineOutput {
    pub scenes: Vec<SceneInfo>,
    pub grid: GridSpec,
    pub indices: Vec<IndexOutput>,
}

impl PipelineOutput {
    pub fn get(&self, kind: IndexKind) -> Option<&IndexOutput> {
        self.indices.iter().find(|o| o.composites.kind == kind)
    }
}

/// Thread-safe progress reporting for the pipeline.
///
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new pipeline stage has started. `total_items` is the number of
    /// work items in this stage, if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// One work item within the current stage has completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when `run_pipeline` delegates.
pub(super) struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
