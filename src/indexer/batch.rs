use super::{ChunkExtractor, CodeChunk, SourceUnit};
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticsSink};
use rayon::prelude::*;

/// Extract chunks from many units in parallel
///
/// Each rayon worker owns its own [`ChunkExtractor`]. Results are concatenated
/// in input order, so the output matches running the units one after another.
/// A unit that fails to parse contributes no chunks and one diagnostic; it
/// never affects the other units.
pub fn extract_batch(units: &[SourceUnit], sink: &dyn DiagnosticsSink) -> Vec<CodeChunk> {
    let per_unit: Vec<Vec<CodeChunk>> = units
        .par_iter()
        .map_init(ChunkExtractor::new, |extractor, unit| match extractor {
            Ok(extractor) => extractor.extract(&unit.text, &unit.source_id, sink),
            Err(e) => {
                sink.report(Diagnostic::new(
                    &unit.source_id,
                    DiagnosticKind::Parse,
                    e.to_string(),
                ));
                Vec::new()
            }
        })
        .collect();

    let chunks: Vec<CodeChunk> = per_unit.into_iter().flatten().collect();
    tracing::info!("Extracted {} chunks from {} units", chunks.len(), units.len());
    chunks
}
