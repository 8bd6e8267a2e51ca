//! JSON format exporter.
//!
//! The written document is the result itself plus a `summary` block for
//! renderers. The summary is recomputed on every write and ignored on read,
//! so writing a result read back from our own output reproduces it exactly.

use serde::Serialize;

use crate::error::Result;
use crate::lifecycle::CorpusSummary;
use crate::result::AnalysisResult;

#[derive(Serialize)]
struct Document<'a> {
    #[serde(flatten)]
    result: &'a AnalysisResult,
    summary: CorpusSummary,
}

/// Export a result to JSON.
pub fn to_json(result: &AnalysisResult, pretty: bool) -> Result<String> {
    let document = Document {
        result,
        summary: result.summary(),
    };
    let json = if pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };
    Ok(json)
}

/// Read a result written by [`to_json`].
pub fn from_json(json: &str) -> Result<AnalysisResult> {
    Ok(serde_json::from_str(json)?)
}
