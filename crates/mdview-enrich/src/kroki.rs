//! Kroki client for Mermaid rendering.
//!
//! Diagrams are sent as `POST {server}/mermaid/svg` with the source as the
//! body. A page's diagrams render in parallel on the rayon pool; failures are
//! reported per diagram so the rest of the page still renders.

use std::time::Duration;

use rayon::prelude::*;
use ureq::Agent;

/// Single diagram rendering error.
#[derive(Debug, thiserror::Error)]
#[error("diagram {index}: {kind}")]
pub struct DiagramError {
    pub index: usize,
    pub kind: DiagramErrorKind,
}

/// Kind of diagram rendering error.
#[derive(Debug, thiserror::Error)]
pub enum DiagramErrorKind {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("I/O error: {0}")]
    Io(String),
}

/// One diagram to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramRequest {
    pub index: usize,
    pub source: String,
}

/// A rendered diagram.
#[derive(Debug)]
pub struct RenderedSvg {
    /// Index matching the original diagram request.
    pub index: usize,
    pub svg: String,
}

/// Create HTTP agent with the specified timeout.
///
/// Non-2xx responses are returned as responses so their bodies can be
/// reported.
pub fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Connection to a Kroki server.
#[derive(Debug, Clone)]
pub struct KrokiClient {
    agent: Agent,
    server_url: String,
}

impl KrokiClient {
    pub fn new(server_url: &str, timeout: Duration) -> Self {
        Self {
            agent: create_agent(timeout),
            server_url: server_url.trim_end_matches('/').to_owned(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Check that the server answers `GET /health` with a success status.
    pub fn health(&self) -> Result<(), String> {
        let url = format!("{}/health", self.server_url);
        let response = self.agent.get(&url).call().map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(format!("HTTP {status} from {url}"))
        }
    }

    fn render_one(&self, diagram: &DiagramRequest) -> Result<RenderedSvg, DiagramError> {
        let url = format!("{}/mermaid/svg", self.server_url);
        let error = |kind| DiagramError {
            index: diagram.index,
            kind,
        };

        let response = self
            .agent
            .post(&url)
            .header("Content-Type", "text/plain")
            .send(diagram.source.as_bytes())
            .map_err(|e| error(DiagramErrorKind::Http(e.to_string())))?;

        let status = response.status().as_u16();
        let mut body = response.into_body();

        if status >= 400 {
            let detail = body
                .read_to_string()
                .unwrap_or_else(|_| String::from("(unable to read error body)"));
            return Err(error(DiagramErrorKind::Http(format!("HTTP {status}: {detail}"))));
        }

        let svg = body
            .read_to_string()
            .map_err(|e| error(DiagramErrorKind::Io(e.to_string())))?;
        Ok(RenderedSvg {
            index: diagram.index,
            svg,
        })
    }

    /// Render all diagrams in parallel, returning successes and failures.
    pub fn render_all(&self, diagrams: &[DiagramRequest]) -> (Vec<RenderedSvg>, Vec<DiagramError>) {
        diagrams
            .par_iter()
            .map(|d| self.render_one(d))
            .partition_map(|result| match result {
                Ok(svg) => rayon::iter::Either::Left(svg),
                Err(error) => rayon::iter::Either::Right(error),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_url_trailing_slash_trimmed() {
        let client = KrokiClient::new("https://kroki.example/", Duration::from_secs(1));
        assert_eq!(client.server_url(), "https://kroki.example");
    }

    #[test]
    fn test_render_all_empty() {
        let client = KrokiClient::new("http://127.0.0.1:9", Duration::from_millis(100));
        let (rendered, errors) = client.render_all(&[]);
        assert!(rendered.is_empty());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_unreachable_server_reports_each_diagram() {
        // Port 9 (discard) is closed on test machines, so connections are refused.
        let client = KrokiClient::new("http://127.0.0.1:9", Duration::from_millis(500));
        let requests = vec![
            DiagramRequest {
                index: 0,
                source: "graph TD; A-->B".to_owned(),
            },
            DiagramRequest {
                index: 1,
                source: "graph TD; C-->D".to_owned(),
            },
        ];
        let (rendered, mut errors) = client.render_all(&requests);
        assert!(rendered.is_empty());
        errors.sort_by_key(|e| e.index);
        assert_eq!(errors.iter().map(|e| e.index).collect::<Vec<_>>(), [0, 1]);
        assert!(client.health().is_err());
    }

    #[test]
    fn test_error_display() {
        let error = DiagramError {
            index: 3,
            kind: DiagramErrorKind::Http("HTTP 400: bad".to_owned()),
        };
        assert_eq!(error.to_string(), "diagram 3: HTTP error: HTTP 400: bad");
    }
}
