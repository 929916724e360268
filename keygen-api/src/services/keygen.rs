//! Key issuance endpoint

use axum::extract::{Path, State};
use axum::Json;

use keygen_core::KeyTriple;

use crate::error::ApiError;
use crate::state::AppState;

/// Parse a path segment as a positive user id
pub fn parse_user_id(raw: &str) -> Result<u64, ApiError> {
    match raw.parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::InvalidUserId),
    }
}

/// GET /keygen/:user_id/:network
pub async fn get_keys(
    State(state): State<AppState>,
    Path((user_id, network)): Path<(String, String)>,
) -> Result<Json<KeyTriple>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    let triple = state.key_manager.resolve(user_id, &network).await?;
    Ok(Json(triple))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_id() {
        assert_eq!(parse_user_id("1").unwrap(), 1);
        assert_eq!(parse_user_id("18446744073709551615").unwrap(), u64::MAX);

        for raw in ["0", "-3", "abc", "", "1.5", "18446744073709551616"] {
            assert!(matches!(parse_user_id(raw), Err(ApiError::InvalidUserId)), "{:?}", raw);
        }
    }
}
