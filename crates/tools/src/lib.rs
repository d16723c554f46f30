//! Tool implementations for Mordomo.
//!
//! The model can request: web search (Tavily), PDF generation, spreadsheet
//! generation, and persistent note read/write. Every tool resolves to the
//! three-shape `ToolOutput` contract and never fails at the Rust level —
//! network errors, rendering failures, and malformed arguments all become
//! `ToolOutput::Error` payloads the model can see.

pub mod notes;
pub mod pdf;
pub mod search;
pub mod spreadsheet;

use mordomo_core::error::ToolError;
use mordomo_core::tool::ToolRegistry;
use mordomo_memory::NoteStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// Build the registry with every available tool.
///
/// Without a Tavily key the search tool is simply not offered to the model.
pub fn build_registry(
    tavily_api_key: Option<&str>,
    notes: Arc<NoteStore>,
    output_dir: PathBuf,
) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();

    match tavily_api_key {
        Some(key) if !key.is_empty() => {
            registry.register(Box::new(search::SearchTool::new(key)))?;
        }
        _ => warn!("TAVILY_API_KEY not set; web search tool disabled"),
    }

    registry.register(Box::new(pdf::PdfTool::new(output_dir.clone())))?;
    registry.register(Box::new(spreadsheet::SpreadsheetTool::new(output_dir)))?;
    registry.register(Box::new(notes::SaveNoteTool::new(notes.clone())))?;
    registry.register(Box::new(notes::ReadNoteTool::new(notes)))?;

    Ok(registry)
}
