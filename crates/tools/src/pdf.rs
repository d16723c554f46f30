//! PDF generation tool.
//!
//! Renders a titled text document into the output directory and returns the
//! path as a file reference. Every call produces a fresh file; the delivery
//! adapter removes it after sending.

use async_trait::async_trait;
use mordomo_core::tool::{Tool, ToolOutput};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use serde::Deserialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const LINE_HEIGHT_MM: f32 = 6.0;
const WRAP_COLUMNS: usize = 90;

pub struct PdfTool {
    output_dir: PathBuf,
}

#[derive(Deserialize)]
struct PdfArgs {
    titulo: String,
    conteudo: String,
}

impl PdfTool {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    fn render(&self, titulo: &str, conteudo: &str) -> Result<PathBuf, String> {
        let path = self
            .output_dir
            .join(format!("documento-{}.pdf", Uuid::new_v4()));

        let (doc, page, layer) = PdfDocument::new(
            titulo,
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "Camada 1",
        );
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| format!("Falha ao carregar fonte: {e}"))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| format!("Falha ao carregar fonte: {e}"))?;

        let mut current_layer = doc.get_page(page).get_layer(layer);
        let mut y = PAGE_HEIGHT_MM - MARGIN_MM;

        current_layer.use_text(titulo, 16.0, Mm(MARGIN_MM), Mm(y), &bold);
        y -= 2.0 * LINE_HEIGHT_MM;

        for line in wrap_lines(conteudo, WRAP_COLUMNS) {
            if y < MARGIN_MM {
                let (next_page, next_layer) =
                    doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Camada 1");
                current_layer = doc.get_page(next_page).get_layer(next_layer);
                y = PAGE_HEIGHT_MM - MARGIN_MM;
            }
            current_layer.use_text(line.as_str(), 11.0, Mm(MARGIN_MM), Mm(y), &font);
            y -= LINE_HEIGHT_MM;
        }

        let file = File::create(&path).map_err(|e| format!("Falha ao criar arquivo: {e}"))?;
        doc.save(&mut BufWriter::new(file))
            .map_err(|e| format!("Falha ao gravar PDF: {e}"))?;

        Ok(path)
    }
}

/// Wrap text at word boundaries, keeping explicit line breaks.
fn wrap_lines(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for raw_line in text.lines() {
        if raw_line.chars().count() <= columns {
            lines.push(raw_line.to_string());
            continue;
        }

        let mut current = String::new();
        for word in raw_line.split_whitespace() {
            if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > columns {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

#[async_trait]
impl Tool for PdfTool {
    fn name(&self) -> &str {
        "gerar_pdf"
    }

    fn description(&self) -> &str {
        "Gera um documento PDF com um título e um corpo de texto. \
         Use quando o usuário pedir um documento, relatório ou resumo em PDF."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "titulo": {
                    "type": "string",
                    "description": "Título do documento"
                },
                "conteudo": {
                    "type": "string",
                    "description": "Corpo do documento em texto corrido"
                }
            },
            "required": ["titulo", "conteudo"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> ToolOutput {
        let args: PdfArgs = match serde_json::from_value(arguments) {
            Ok(a) => a,
            Err(e) => return ToolOutput::Error(format!("Argumentos inválidos: {e}")),
        };

        if args.titulo.trim().is_empty() || args.conteudo.trim().is_empty() {
            return ToolOutput::Error("Título e conteúdo são obrigatórios.".into());
        }

        debug!(titulo = %args.titulo, "Rendering PDF");

        match self.render(args.titulo.trim(), &args.conteudo) {
            Ok(path) => ToolOutput::File(path),
            Err(message) => ToolOutput::Error(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn renders_a_pdf_file() {
        let dir = tempdir().unwrap();
        let tool = PdfTool::new(dir.path().to_path_buf());

        let output = tool
            .execute(serde_json::json!({
                "titulo": "Resumo de produtividade",
                "conteudo": "Primeira linha.\nSegunda linha com um pouco mais de texto."
            }))
            .await;

        let path = output.file_path().expect("expected a file output");
        assert!(path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("pdf"));
        // PDF magic header
        let bytes = std::fs::read(path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn each_call_produces_a_new_file() {
        let dir = tempdir().unwrap();
        let tool = PdfTool::new(dir.path().to_path_buf());
        let args = serde_json::json!({"titulo": "T", "conteudo": "C"});

        let first = tool.execute(args.clone()).await;
        let second = tool.execute(args).await;
        assert_ne!(first.file_path(), second.file_path());
    }

    #[tokio::test]
    async fn missing_arguments_are_error_payload() {
        let dir = tempdir().unwrap();
        let tool = PdfTool::new(dir.path().to_path_buf());
        let output = tool.execute(serde_json::json!({"titulo": "só título"})).await;
        assert!(matches!(output, ToolOutput::Error(_)));
    }

    #[tokio::test]
    async fn unwritable_directory_is_error_payload() {
        let tool = PdfTool::new(PathBuf::from("/nonexistent/mordomo"));
        let output = tool
            .execute(serde_json::json!({"titulo": "T", "conteudo": "C"}))
            .await;
        assert!(matches!(output, ToolOutput::Error(_)));
    }

    #[test]
    fn wrap_preserves_short_lines() {
        let lines = wrap_lines("curta\noutra", 90);
        assert_eq!(lines, vec!["curta".to_string(), "outra".to_string()]);
    }

    #[test]
    fn wrap_breaks_long_lines_at_words() {
        let long = "palavra ".repeat(30);
        let lines = wrap_lines(long.trim(), 40);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.chars().count() <= 40));
    }
}
