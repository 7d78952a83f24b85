//! Servidor Axum para inspecionar e codificar features do parser de dependências.
//!
//! Mantém uma única [`FeatureSession`] atrás de um `Mutex`: as requisições que alteram o
//! dicionário são serializadas, preservando a ordem determinística de atribuição de ids.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use depfeat_core::{FeatureConfig, FeatureError, FeatureNode, FeatureSession, InputToken, ParserState};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// Estado compartilhado da aplicação
struct AppState {
    session: Mutex<FeatureSession>,
    /// Arquivo de dicionário usado por `/dictionary/save` (`DEPFEAT_DICT`).
    dict_path: Option<PathBuf>,
}

impl AppState {
    fn session(&self) -> MutexGuard<'_, FeatureSession> {
        // um handler que entrou em pânico não invalida o dicionário: toda inserção é atômica
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Deserialize)]
struct BoundaryRequest {
    current: InputToken,
    next: InputToken,
}

#[derive(Deserialize)]
struct LatticeRequest {
    state: ParserState,
}

#[derive(Deserialize)]
struct EncodeRequest {
    features: Vec<String>,
    #[serde(default)]
    label: Option<String>,
    /// Codifica sem inserir features novas (inferência).
    #[serde(default)]
    frozen: bool,
}

#[derive(Serialize)]
struct FeaturesResponse {
    features: Vec<String>,
}

#[derive(Serialize)]
struct EncodeResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    label_id: Option<usize>,
    nodes: Vec<FeatureNode>,
}

#[derive(Serialize)]
struct StatsResponse {
    features: usize,
    labels: usize,
}

/// Erro do núcleo traduzido para status HTTP.
struct ApiError(StatusCode, String);

impl From<FeatureError> for ApiError {
    fn from(err: FeatureError) -> Self {
        let status = match err {
            FeatureError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        ApiError(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({ "error": self.1 }))).into_response()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::var_os("DEPFEAT_CONFIG") {
        Some(path) => FeatureConfig::from_path(path)?,
        None => FeatureConfig::default(),
    };
    let dict_path = std::env::var_os("DEPFEAT_DICT").map(PathBuf::from);
    let session = match &dict_path {
        Some(path) if path.exists() => {
            let session = FeatureSession::load(path, config)?;
            info!(
                "Dicionário carregado de {}: {} features, {} labels",
                path.display(),
                session.features().size(),
                session.labels().size()
            );
            session
        }
        _ => FeatureSession::new(config),
    };

    let state = Arc::new(AppState {
        session: Mutex::new(session),
        dict_path,
    });

    let addr: SocketAddr = std::env::var("DEPFEAT_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Servidor de features iniciado em http://{addr}");
    axum::serve(listener, app(state)).await?;
    Ok(())
}

fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/features/boundary", post(boundary_handler))
        .route("/features/lattice", post(lattice_handler))
        .route("/encode", post(encode_handler))
        .route("/labels/:id", get(label_handler))
        .route("/dictionary/save", post(save_handler))
        .layer(cors)
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn stats_handler(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let session = state.session();
    Json(StatsResponse {
        features: session.features().size(),
        labels: session.labels().size(),
    })
}

/// Features de fronteira entre dois tokens adjacentes
async fn boundary_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BoundaryRequest>,
) -> Json<FeaturesResponse> {
    let features = state.session().boundary_features(&req.current, &req.next);
    Json(FeaturesResponse { features })
}

/// Features de lattice de uma configuração do parser
async fn lattice_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LatticeRequest>,
) -> Json<FeaturesResponse> {
    let features = state.session().lattice_features(&req.state);
    Json(FeaturesResponse { features })
}

/// Codifica features (e opcionalmente o label gold) no formato do classificador
async fn encode_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EncodeRequest>,
) -> Result<Json<EncodeResponse>, ApiError> {
    let mut session = state.session();
    let response = match (req.frozen, req.label) {
        (true, _) => EncodeResponse {
            label_id: None,
            nodes: session.encode_frozen(&req.features)?,
        },
        (false, Some(label)) => {
            let (label_id, nodes) = session.encode_instance(&label, &req.features)?;
            EncodeResponse {
                label_id: Some(label_id),
                nodes,
            }
        }
        (false, None) => EncodeResponse {
            label_id: None,
            nodes: session.map_for_classifier(&req.features)?,
        },
    };
    Ok(Json(response))
}

async fn label_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<usize>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = state.session();
    let label = session.label_text(id)?;
    Ok(Json(serde_json::json!({ "id": id, "label": label })))
}

/// Grava o snapshot atual do dicionário em `DEPFEAT_DICT`
async fn save_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatsResponse>, ApiError> {
    let Some(path) = state.dict_path.clone() else {
        warn!("Pedido de gravação sem DEPFEAT_DICT configurado");
        return Err(ApiError(
            StatusCode::BAD_REQUEST,
            "DEPFEAT_DICT não configurado".to_string(),
        ));
    };

    // a escrita em disco roda fora das threads do runtime
    let stats = tokio::task::spawn_blocking(move || -> Result<StatsResponse, FeatureError> {
        let session = state.session();
        session.save(&path)?;
        info!("Dicionário salvo em {}", path.display());
        Ok(StatsResponse {
            features: session.features().size(),
            labels: session.labels().size(),
        })
    })
    .await
    .map_err(|err| ApiError(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))??;
    Ok(Json(stats))
}
