//! Persistent note tools.
//!
//! `salvar_memoria` writes a topic, `ler_memoria` reads one back. A missing
//! topic is a normal answer for the model, not an error payload.

use async_trait::async_trait;
use mordomo_core::tool::{Tool, ToolOutput};
use mordomo_memory::NoteStore;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

pub struct SaveNoteTool {
    store: Arc<NoteStore>,
}

pub struct ReadNoteTool {
    store: Arc<NoteStore>,
}

#[derive(Deserialize)]
struct SaveArgs {
    topico: String,
    conteudo: String,
}

#[derive(Deserialize)]
struct ReadArgs {
    topico: String,
}

impl SaveNoteTool {
    pub fn new(store: Arc<NoteStore>) -> Self {
        Self { store }
    }
}

impl ReadNoteTool {
    pub fn new(store: Arc<NoteStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for SaveNoteTool {
    fn name(&self) -> &str {
        "salvar_memoria"
    }

    fn description(&self) -> &str {
        "Salva uma informação importante sobre o usuário para lembrar depois. \
         Use quando o usuário pedir para lembrar de algo ou contar um fato pessoal."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "topico": {
                    "type": "string",
                    "description": "Assunto curto da anotação, ex: 'aniversário da esposa'"
                },
                "conteudo": {
                    "type": "string",
                    "description": "O que deve ser lembrado"
                }
            },
            "required": ["topico", "conteudo"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> ToolOutput {
        let args: SaveArgs = match serde_json::from_value(arguments) {
            Ok(a) => a,
            Err(e) => return ToolOutput::Error(format!("Argumentos inválidos: {e}")),
        };

        if args.topico.trim().is_empty() {
            return ToolOutput::Error("O tópico da anotação está vazio.".into());
        }

        debug!(topico = %args.topico, "Saving note");

        match self.store.save(&args.topico, &args.conteudo).await {
            Ok(()) => ToolOutput::Text(format!(
                "Anotado: \"{}\" salvo com sucesso.",
                args.topico.trim()
            )),
            Err(e) => ToolOutput::Error(format!("Falha ao salvar anotação: {e}")),
        }
    }
}

#[async_trait]
impl Tool for ReadNoteTool {
    fn name(&self) -> &str {
        "ler_memoria"
    }

    fn description(&self) -> &str {
        "Consulta uma informação salva anteriormente sobre o usuário. \
         Use quando precisar de um fato pessoal já mencionado em outra conversa."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "topico": {
                    "type": "string",
                    "description": "Assunto da anotação a consultar"
                }
            },
            "required": ["topico"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> ToolOutput {
        let args: ReadArgs = match serde_json::from_value(arguments) {
            Ok(a) => a,
            Err(e) => return ToolOutput::Error(format!("Argumentos inválidos: {e}")),
        };

        debug!(topico = %args.topico, "Reading note");

        match self.store.read(&args.topico).await {
            Some(content) => ToolOutput::Text(content),
            None => ToolOutput::Text(format!(
                "Nenhuma anotação encontrada sobre \"{}\".",
                args.topico.trim()
            )),
        }
    }
}
