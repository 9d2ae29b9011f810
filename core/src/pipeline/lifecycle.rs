use crate::documents::model::{LifecycleState, PipelineStep};

/// The state an `advance` moves to from `from`, and the component it runs.
pub fn next_step(from: LifecycleState) -> Option<(LifecycleState, PipelineStep)> {
    use LifecycleState::*;
    match from {
        Uploaded => Some((Extracting, PipelineStep::Extraction)),
        Extracting => Some((Extracted, PipelineStep::Normalization)),
        Extracted => Some((Categorizing, PipelineStep::Categorization)),
        Categorizing => Some((Analyzing, PipelineStep::AnomalyDetection)),
        Analyzing => Some((Ready, PipelineStep::InsightGeneration)),
        Ready | Failed => None,
    }
}

pub fn valid_transition(from: LifecycleState, to: LifecycleState) -> bool {
    if from.is_terminal() {
        return false;
    }
    if to == LifecycleState::Failed {
        return true;
    }
    next_step(from).map(|(next, _)| next == to).unwrap_or(false)
}
