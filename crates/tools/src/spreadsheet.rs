//! Spreadsheet generation tool.
//!
//! Renders an XLSX workbook (first row treated as a header) into the output
//! directory and returns the path as a file reference.

use async_trait::async_trait;
use mordomo_core::tool::{Tool, ToolOutput};
use rust_xlsxwriter::{Format, Workbook};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

pub struct SpreadsheetTool {
    output_dir: PathBuf,
}

#[derive(Deserialize)]
struct SpreadsheetArgs {
    titulo: String,
    linhas: Vec<Vec<String>>,
}

impl SpreadsheetTool {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    fn render(&self, linhas: &[Vec<String>]) -> Result<PathBuf, String> {
        let path = self
            .output_dir
            .join(format!("planilha-{}.xlsx", Uuid::new_v4()));

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        let header_format = Format::new().set_bold();

        for (row_idx, row) in linhas.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                let row_num = row_idx as u32;
                let col_num = col_idx as u16;
                let result = if row_idx == 0 {
                    worksheet.write_string_with_format(row_num, col_num, cell, &header_format)
                } else {
                    worksheet.write_string(row_num, col_num, cell)
                };
                result.map_err(|e| format!("Falha ao escrever célula: {e}"))?;
            }
        }

        workbook
            .save(&path)
            .map_err(|e| format!("Falha ao gravar planilha: {e}"))?;

        Ok(path)
    }
}

#[async_trait]
impl Tool for SpreadsheetTool {
    fn name(&self) -> &str {
        "gerar_planilha"
    }

    fn description(&self) -> &str {
        "Gera uma planilha Excel (XLSX) a partir de linhas de dados. \
         A primeira linha é o cabeçalho. Use quando o usuário pedir uma planilha ou tabela."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "titulo": {
                    "type": "string",
                    "description": "Título ou assunto da planilha"
                },
                "linhas": {
                    "type": "array",
                    "description": "Linhas da planilha; a primeira é o cabeçalho",
                    "items": {
                        "type": "array",
                        "items": { "type": "string" }
                    }
                }
            },
            "required": ["titulo", "linhas"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> ToolOutput {
        let args: SpreadsheetArgs = match serde_json::from_value(arguments) {
            Ok(a) => a,
            Err(e) => return ToolOutput::Error(format!("Argumentos inválidos: {e}")),
        };

        if args.linhas.is_empty() {
            return ToolOutput::Error("A planilha precisa de pelo menos uma linha.".into());
        }

        debug!(titulo = %args.titulo, rows = args.linhas.len(), "Rendering spreadsheet");

        match self.render(&args.linhas) {
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
    async fn renders_an_xlsx_file() {
        let dir = tempdir().unwrap();
        let tool = SpreadsheetTool::new(dir.path().to_path_buf());

        let output = tool
            .execute(serde_json::json!({
                "titulo": "Gastos do mês",
                "linhas": [
                    ["Item", "Valor"],
                    ["Mercado", "R$ 450,00"],
                    ["Transporte", "R$ 120,00"]
                ]
            }))
            .await;

        let path = output.file_path().expect("expected a file output");
        assert!(path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("xlsx"));
        // XLSX files are ZIP containers
        let bytes = std::fs::read(path).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn empty_rows_are_error_payload() {
        let dir = tempdir().unwrap();
        let tool = SpreadsheetTool::new(dir.path().to_path_buf());
        let output = tool
            .execute(serde_json::json!({"titulo": "Vazia", "linhas": []}))
            .await;
        assert!(matches!(output, ToolOutput::Error(_)));
    }

    #[tokio::test]
    async fn malformed_rows_are_error_payload() {
        let dir = tempdir().unwrap();
        let tool = SpreadsheetTool::new(dir.path().to_path_buf());
        let output = tool
            .execute(serde_json::json!({"titulo": "X", "linhas": [1, 2, 3]}))
            .await;
        assert!(matches!(output, ToolOutput::Error(_)));
    }
}
