use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::rejection::{FormRejection, JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use riskcalc_core::{
    assess, Assessment, FeatureDictionary, Locale, ModelAdapter, ModelStatus, RiskError, VERSION,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::session::SessionKey;
use crate::views::{self, ResultView, LANG_FIELD};

#[derive(Clone)]
pub struct AppState {
    pub dictionary: FeatureDictionary,
    pub adapter: ModelAdapter,
    pub session: SessionKey,
    pub default_locale: Locale,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(adapter: ModelAdapter, session: SessionKey) -> Self {
        Self {
            dictionary: FeatureDictionary::standard(),
            adapter,
            session,
            default_locale: Locale::default(),
            metrics: None,
        }
    }

    /// Locale for a submitted tag; unsupported tags fall back to the default
    fn locale_from_tag(&self, tag: Option<&str>) -> Locale {
        match tag.map(str::parse::<Locale>) {
            Some(Ok(locale)) => locale,
            Some(Err(err)) => {
                warn!(error = %err, fallback = %self.default_locale, "Ignoring language tag");
                self.default_locale
            }
            None => self.default_locale,
        }
    }
}

type SharedState = Arc<AppState>;

/// Request handling stages, used to label logs and failure metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    AwaitingInput,
    Validating,
    Predicting,
    Rendering,
    Failed,
}

impl Stage {
    fn of_error(err: &RiskError) -> Self {
        if err.is_validation() {
            Stage::Validating
        } else {
            Stage::Predicting
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Stage::AwaitingInput => "awaiting_input",
            Stage::Validating => "validating",
            Stage::Predicting => "predicting",
            Stage::Rendering => "rendering",
            Stage::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<RiskError> for ApiError {
    fn from(err: RiskError) -> Self {
        let status = if err.is_validation() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, payload).into_response()
    }
}

pub async fn start_server(state: AppState, addr: &str) -> Result<()> {
    let app = build_router(Arc::new(state));
    let listener = bind_listener(addr).await?;
    info!("Risk calculator listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server terminated unexpectedly")
}

async fn bind_listener(addr: &str) -> Result<tokio::net::TcpListener> {
    if let Ok(socket_addr) = addr.parse::<SocketAddr>() {
        tokio::net::TcpListener::bind(socket_addr)
            .await
            .with_context(|| format!("failed to bind listener on {socket_addr}"))
    } else {
        tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind listener on {addr}"))
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Unable to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(handle_form))
        .route("/predict", post(handle_predict))
        .route("/api/predict", post(handle_api_predict))
        .route("/health", get(handle_health))
        .route("/metrics", get(handle_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn html_with_session(state: &AppState, locale: Locale, body: String) -> Response {
    (
        [(header::SET_COOKIE, state.session.set_cookie(locale))],
        Html(body),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct FormParams {
    #[serde(default)]
    lang: Option<String>,
}

/// GET / - render the input form in the session language
async fn handle_form(
    State(state): State<SharedState>,
    query: Result<Query<FormParams>, QueryRejection>,
    headers: HeaderMap,
) -> Response {
    let requested = match query {
        Ok(Query(params)) => params.lang,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Ignoring malformed query string");
            None
        }
    };
    let locale = match requested.as_deref() {
        Some(tag) => state.locale_from_tag(Some(tag)),
        None => state
            .session
            .read(&headers)
            .unwrap_or(state.default_locale),
    };
    debug!(stage = %Stage::AwaitingInput, %locale, "Serving input form");

    html_with_session(&state, locale, views::render_form(locale))
}

/// Split the language field from the answers, keeping submission order
fn split_submission(fields: Vec<(String, String)>) -> (Option<String>, Vec<(String, String)>) {
    let mut lang = None;
    let mut inputs = Vec::with_capacity(fields.len());
    for (name, value) in fields {
        if name == LANG_FIELD {
            lang.get_or_insert(value);
        } else {
            inputs.push((name, value));
        }
    }
    (lang, inputs)
}

fn evaluate(state: &AppState, inputs: &[(String, String)]) -> Result<Assessment, RiskError> {
    debug!(stage = %Stage::Validating, fields = inputs.len(), "Encoding submission");
    let assessment = assess(
        &state.dictionary,
        &state.adapter,
        inputs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
    )?;
    debug!(
        stage = %Stage::Rendering,
        percent = assessment.percent,
        tier = %assessment.tier,
        source = assessment.source.as_str(),
        "Prediction complete"
    );
    Ok(assessment)
}

fn record_failure(err: &RiskError) {
    let stage = Stage::of_error(err);
    warn!(stage = %stage, outcome = %Stage::Failed, error = %err, "Prediction failed");
    metrics::counter!("riskcalc_prediction_errors_total", "stage" => stage.as_str()).increment(1);
}

/// POST /predict - evaluate the submitted form
///
/// Every failure renders the error page with status 200.
async fn handle_predict(
    State(state): State<SharedState>,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Response {
    let fields = match form {
        Ok(Form(fields)) => fields,
        Err(rejection) => {
            warn!(stage = %Stage::Failed, error = %rejection, "Unreadable form submission");
            let locale = state.default_locale;
            return html_with_session(
                &state,
                locale,
                views::render_error(locale, &rejection.body_text()),
            );
        }
    };

    let (lang, inputs) = split_submission(fields);
    let locale = state.locale_from_tag(lang.as_deref());

    let body = match evaluate(&state, &inputs) {
        Ok(assessment) => views::render_result(&ResultView {
            locale,
            assessment: &assessment,
            inputs: &inputs,
        }),
        Err(err) => {
            record_failure(&err);
            views::render_error(locale, &err.to_string())
        }
    };

    html_with_session(&state, locale, body)
}

#[derive(Debug, Deserialize)]
struct ApiPredictRequest {
    #[serde(default)]
    lang: Option<String>,
    inputs: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
struct ApiPredictResponse {
    lang: Locale,
    /// Unrounded probability in percent
    percent: f64,
    formatted: String,
    tier: &'static str,
    tier_label: &'static str,
    degraded: bool,
}

/// POST /api/predict - JSON variant of the form submission
async fn handle_api_predict(
    State(state): State<SharedState>,
    request: Result<Json<ApiPredictRequest>, JsonRejection>,
) -> Result<Json<ApiPredictResponse>, ApiError> {
    let Json(request) = request.map_err(|rejection| {
        warn!(stage = %Stage::Failed, error = %rejection.body_text(), "Unreadable JSON submission");
        ApiError::new(rejection.status(), rejection.body_text())
    })?;
    let locale = state.locale_from_tag(request.lang.as_deref());
    let inputs: Vec<(String, String)> = request.inputs.into_iter().collect();

    let assessment = evaluate(&state, &inputs).map_err(|err| {
        record_failure(&err);
        ApiError::from(err)
    })?;

    Ok(Json(ApiPredictResponse {
        lang: locale,
        percent: assessment.percent,
        formatted: assessment.formatted_probability(),
        tier: assessment.tier.code(),
        tier_label: assessment.tier_label(locale),
        degraded: assessment.is_degraded(),
    }))
}

#[derive(Debug, Serialize)]
struct HealthResponse<'a> {
    status: &'static str,
    model: &'a ModelStatus,
    version: &'static str,
}

async fn handle_health(State(state): State<SharedState>) -> Response {
    let status = if state.adapter.is_degraded() {
        "degraded"
    } else {
        "ok"
    };
    Json(HealthResponse {
        status,
        model: state.adapter.status(),
        version: VERSION,
    })
    .into_response()
}

async fn handle_metrics(State(state): State<SharedState>) -> Response {
    match &state.metrics {
        Some(handle) => {
            let mut response = handle.render().into_response();
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            );
            response
        }
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_submission_keeps_order() {
        let fields = vec![
            ("抑郁".to_string(), "否".to_string()),
            ("current_lang".to_string(), "en".to_string()),
            ("年龄".to_string(), "60-69岁".to_string()),
        ];
        let (lang, inputs) = split_submission(fields);
        assert_eq!(lang.as_deref(), Some("en"));
        assert_eq!(inputs[0].0, "抑郁");
        assert_eq!(inputs[1].0, "年龄");
    }

    #[test]
    fn test_unsupported_tag_uses_default() {
        let state = AppState::new(ModelAdapter::degraded("test"), SessionKey::new([1; 32]));
        assert_eq!(state.locale_from_tag(Some("fr")), Locale::ZhCn);
        assert_eq!(state.locale_from_tag(Some("en")), Locale::En);
        assert_eq!(state.locale_from_tag(None), Locale::ZhCn);
    }

    #[test]
    fn test_api_error_status() {
        let validation = ApiError::from(RiskError::MissingFeature { feature: "Age" });
        assert_eq!(validation.status, StatusCode::UNPROCESSABLE_ENTITY);
        let inference = ApiError::from(RiskError::Inference("nan".into()));
        assert_eq!(inference.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
