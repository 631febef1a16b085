//! Procedure endpoints of the dalil.dz API

use crate::shared::api_utils::api_url;
use contracts::domain::a001_procedure::aggregate::ProcedureDto;
use gloo_net::http::Request;

/// Create a procedure from a validated wizard payload
pub async fn create_procedure(dto: &ProcedureDto) -> Result<(), String> {
    let response = Request::post(&api_url("/api/procedures"))
        .json(dto)
        .map_err(|e| e.to_string())?
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !response.ok() {
        let body = response.text().await.unwrap_or_default();
        return Err(format!("HTTP {}: {}", response.status(), body));
    }
    Ok(())
}
