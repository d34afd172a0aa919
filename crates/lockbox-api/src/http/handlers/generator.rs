//! Credential generator and cipher self-test handlers.

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use lockbox_infra::crypto::generator;
use lockbox_types::generator::GeneratorOptions;

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthenticatedOwner;
use crate::http::handlers::vault::MasterPasswordBody;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

/// Query of `GET /generate`. Absent fields take the generator defaults.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateQuery {
    pub length: Option<usize>,
    pub upper: Option<bool>,
    pub lower: Option<bool>,
    pub digits: Option<bool>,
    pub symbols: Option<bool>,
    pub exclude_ambiguous: Option<bool>,
    /// Guarantee one character of each class (all classes are then used).
    #[serde(default)]
    pub strong: bool,
}

impl GenerateQuery {
    fn options(&self) -> GeneratorOptions {
        let defaults = GeneratorOptions::default();
        if self.strong {
            return GeneratorOptions {
                length: self.length.unwrap_or(defaults.length),
                exclude_ambiguous: self.exclude_ambiguous.unwrap_or(false),
                ..defaults
            };
        }
        GeneratorOptions {
            length: self.length.unwrap_or(defaults.length),
            use_upper: self.upper.unwrap_or(defaults.use_upper),
            use_lower: self.lower.unwrap_or(defaults.use_lower),
            use_digits: self.digits.unwrap_or(defaults.use_digits),
            use_symbols: self.symbols.unwrap_or(defaults.use_symbols),
            exclude_ambiguous: self.exclude_ambiguous.unwrap_or(defaults.exclude_ambiguous),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GeneratedPassword {
    pub password: String,
    pub length: usize,
    pub entropy_bits: f64,
}

/// GET /api/v1/generate - Generate a password without storing it.
pub async fn generate_password(
    _owner: AuthenticatedOwner,
    Query(query): Query<GenerateQuery>,
) -> Result<Json<ApiResponse<GeneratedPassword>>, AppError> {
    let clock = RequestClock::start();

    let options = query.options();
    let password = if query.strong {
        generator::generate_strong_with(options.length, options.exclude_ambiguous)?
    } else {
        generator::generate(&options)?
    };

    Ok(Json(clock.respond(GeneratedPassword {
        length: password.chars().count(),
        entropy_bits: generator::estimate_entropy_bits(&options),
        password,
    })))
}

/// POST /api/v1/selftest - Round-trip self-test of the cipher under a master password.
pub async fn self_test(
    State(state): State<AppState>,
    _owner: AuthenticatedOwner,
    Json(body): Json<MasterPasswordBody>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let clock = RequestClock::start();

    let ok = state.vault_service.verify_master(body.master_password).await?;

    Ok(Json(clock.respond(serde_json::json!({ "ok": ok }))))
}
