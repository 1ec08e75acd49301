use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::pipeline::{PipelineReport, StageOutput};

/// Write one stage's output as pretty JSON under `dir`, named after the
/// stage. Returns the path written.
pub fn write_stage_dump(dir: &Path, stage: &StageOutput) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.json", stage.stage));
    let file = File::create(&path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, stage)?;
    Ok(path)
}

/// Persist every stage of a pipeline run, one file per stage.
pub fn write_pipeline_dumps(dir: &Path, report: &PipelineReport) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(report.stages.len());
    for stage in &report.stages {
        paths.push(write_stage_dump(dir, stage)?);
    }
    Ok(paths)
}
