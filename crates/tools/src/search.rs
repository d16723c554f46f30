//! Web search tool backed by the Tavily API.
//!
//! Results are condensed into `Fonte:`/`Conteúdo:` lines so the model gets
//! a readable digest instead of raw JSON. Any HTTP or decode failure comes
//! back as a `ToolOutput::Error` payload.

use async_trait::async_trait;
use mordomo_core::tool::{Tool, ToolOutput};
use serde::Deserialize;
use tracing::{debug, warn};

const TAVILY_URL: &str = "https://api.tavily.com/search";
const REQUEST_TIMEOUT_SECS: u64 = 15;

pub struct SearchTool {
    api_key: String,
    url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct SearchArgs {
    query: String,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    url: String,
    content: String,
}

impl SearchTool {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            api_key: api_key.into(),
            url: TAVILY_URL.into(),
            client,
        }
    }

    /// Override the endpoint (tests).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    fn format_results(results: &[TavilyResult]) -> String {
        results
            .iter()
            .map(|r| format!("Fonte: {}\nConteúdo: {}", r.url, r.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    async fn run_search(&self, query: &str) -> Result<String, String> {
        let body = serde_json::json!({
            "api_key": self.api_key,
            "query": query,
            "search_depth": "basic",
        });

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Erro de rede na busca: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %text, "Tavily returned error");
            return Err(format!("Busca falhou (status {})", status.as_u16()));
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| format!("Resposta de busca inválida: {e}"))?;

        if parsed.results.is_empty() {
            return Ok("Nenhum resultado encontrado.".into());
        }

        Ok(Self::format_results(&parsed.results))
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "buscar_web"
    }

    fn description(&self) -> &str {
        "Busca na internet informações em tempo real ou sobre eventos recentes. \
         Use para perguntas sobre notícias, cotações, resultados esportivos, etc."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "A pergunta ou tópico a ser pesquisado"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> ToolOutput {
        let args: SearchArgs = match serde_json::from_value(arguments) {
            Ok(a) => a,
            Err(e) => return ToolOutput::Error(format!("Argumentos inválidos: {e}")),
        };

        if args.query.trim().is_empty() {
            return ToolOutput::Error("A consulta de busca está vazia.".into());
        }

        debug!(query = %args.query, "Executing web search");

        match self.run_search(args.query.trim()).await {
            Ok(digest) => ToolOutput::Text(digest),
            Err(message) => ToolOutput::Error(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mordomo_core::tool::Tool;

    #[test]
    fn descriptor_shape() {
        let tool = SearchTool::new("tvly-key");
        let descriptor = tool.descriptor();
        assert_eq!(descriptor.name, "buscar_web");
        assert!(descriptor.parameters["properties"].get("query").is_some());
    }

    #[tokio::test]
    async fn missing_query_is_error_payload() {
        let tool = SearchTool::new("tvly-key");
        let output = tool.execute(serde_json::json!({})).await;
        assert!(matches!(output, ToolOutput::Error(_)));
    }

    #[tokio::test]
    async fn empty_query_is_error_payload() {
        let tool = SearchTool::new("tvly-key");
        let output = tool.execute(serde_json::json!({"query": "  "})).await;
        assert!(matches!(output, ToolOutput::Error(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_error_payload_not_panic() {
        let tool = SearchTool::new("tvly-key").with_url("http://127.0.0.1:1/search");
        let output = tool
            .execute(serde_json::json!({"query": "cotação do dólar"}))
            .await;
        assert!(matches!(output, ToolOutput::Error(_)));
    }

    #[test]
    fn result_formatting() {
        let results = vec![
            TavilyResult {
                url: "https://example.com/a".into(),
                content: "Dólar a R$ 5,12".into(),
            },
            TavilyResult {
                url: "https://example.com/b".into(),
                content: "Euro a R$ 5,50".into(),
            },
        ];
        let digest = SearchTool::format_results(&results);
        assert!(digest.contains("Fonte: https://example.com/a"));
        assert!(digest.contains("Conteúdo: Dólar a R$ 5,12"));
        assert!(digest.contains("Fonte: https://example.com/b"));
    }

    #[test]
    fn response_parsing() {
        let data = r#"{"results": [{"url": "https://x", "content": "y", "score": 0.9}]}"#;
        let parsed: TavilyResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.results[0].url, "https://x");
    }
}
