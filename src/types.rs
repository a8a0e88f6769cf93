use std::fmt;

/// How far a scenario's map data has progressed through the pipeline.
///
/// This is never stored in memory between runs: the witness of a stage is
/// the presence of its output files on disk, so the status is re-derived
/// every time (see `PipelineRunner::status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineStage {
    NotWritten,
    Written,
    Extracted,
    Contracted,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::NotWritten => "not-written",
            PipelineStage::Written => "written",
            PipelineStage::Extracted => "extracted",
            PipelineStage::Contracted => "contracted",
        };
        f.write_str(name)
    }
}

/// The two external stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Extract,
    Contract,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Extract => f.write_str("extract"),
            StageKind::Contract => f.write_str("contract"),
        }
    }
}
