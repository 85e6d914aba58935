//! Subcommand implementations

use std::path::Path;
use std::sync::Arc;

use sketch_engine::validation::sanitize;
use sketch_engine::{SketchGraph, SketchSession, WorkflowDocument, WorkflowExporter};
use sketch_gateway::{
    DeployClient, GatewayConfig, GatewayError, GeminiBackend, GenerationBackend, ReplayBackend,
    SharedSession, SketchGateway,
};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Engine error: {0}")]
    Engine(#[from] sketch_engine::SketchError),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid sketch file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Deployment failed: {0}")]
    Deploy(String),
}

pub type Result<T> = std::result::Result<T, CliError>;

pub async fn generate(prompt: &str, replay: Option<&Path>, deploy: bool, pretty: bool) -> Result<()> {
    let config = GatewayConfig::from_env();
    let backend: Box<dyn GenerationBackend> = match replay {
        Some(path) => Box::new(
            ReplayBackend::from_file(path)
                .await
                .map_err(GatewayError::from)?,
        ),
        None => Box::new(GeminiBackend::new(config.generation.clone()).map_err(GatewayError::from)?),
    };
    let gateway = SketchGateway::new(backend);
    log::debug!("Using the {} generation backend", gateway.backend_name());

    let session: SharedSession = Arc::new(parking_lot::Mutex::new(SketchSession::with_demo()));
    let explanation = gateway.generate_into(&session, prompt).await?;
    log::info!("{}", explanation);

    let document = session.lock().export(&WorkflowExporter::default());
    print_document(&document, pretty)?;

    if deploy {
        deploy_document(&config, &document).await?;
    }
    Ok(())
}

pub async fn export(input: Option<&Path>, pretty: bool) -> Result<()> {
    let graph = load_graph(input).await?;
    print_document(&WorkflowExporter::default().export(&graph), pretty)
}

pub async fn deploy(input: Option<&Path>) -> Result<()> {
    let graph = load_graph(input).await?;
    let document = WorkflowExporter::default().export(&graph);
    deploy_document(&GatewayConfig::from_env(), &document).await
}

/// Read a sketch file, or fall back to the demo sketch
///
/// Files are repaired the same way generated sketches are.
pub async fn load_graph(input: Option<&Path>) -> Result<SketchGraph> {
    let Some(path) = input else {
        return Ok(SketchGraph::demo());
    };
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Read {
            path: path.display().to_string(),
            source,
        })?;
    let report = sanitize(serde_json::from_str(&text)?);
    if !report.is_clean() {
        log::warn!(
            "Dropped {} node(s) and {} edge(s) from {}",
            report.dropped_nodes.len(),
            report.dropped_edges.len(),
            path.display()
        );
    }
    Ok(report.graph)
}

fn print_document(document: &WorkflowDocument, pretty: bool) -> Result<()> {
    let json = if pretty {
        document.to_json_pretty()?
    } else {
        document.to_json()?
    };
    println!("{}", json);
    Ok(())
}

async fn deploy_document(config: &GatewayConfig, document: &WorkflowDocument) -> Result<()> {
    let client = DeployClient::new(config.deploy.clone())?;
    let status = client.deploy_status(document).await;
    if status.ok {
        log::info!("{}", status.message);
        Ok(())
    } else {
        Err(CliError::Deploy(status.message))
    }
}
