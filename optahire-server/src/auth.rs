use crate::error::AuthError;
use async_trait::async_trait;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use optahire_core::{Identity, Role, RoomId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Resolves the bearer token presented at connect time to a user.
///
/// Token issuance lives in the main application; the signaling server only
/// needs this lookup.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<Identity, AuthError>;

    /// Whether `identity` belongs to the interview behind `room_id`.
    /// Checked on every join, before the relay sees it.
    async fn authorize_room(&self, identity: &Identity, room_id: &RoomId) -> Result<(), AuthError>;
}

/// One statically configured token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenGrant {
    pub token: String,
    pub user_id: UserId,
    pub display_name: String,
    pub role: Role,
    /// Interview rooms this user may join; `None` allows any room.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rooms: Option<Vec<RoomId>>,
}

pub struct StaticTokenAuthenticator {
    grants: HashMap<String, Identity>,
    rooms: HashMap<UserId, HashSet<RoomId>>,
}

impl StaticTokenAuthenticator {
    pub fn new(grants: impl IntoIterator<Item = TokenGrant>) -> Self {
        let mut tokens = HashMap::new();
        let mut rooms: HashMap<UserId, HashSet<RoomId>> = HashMap::new();

        for grant in grants {
            if let Some(allowed) = grant.rooms {
                rooms
                    .entry(grant.user_id.clone())
                    .or_default()
                    .extend(allowed);
            }
            let identity = Identity {
                user_id: grant.user_id,
                display_name: grant.display_name,
                role: grant.role,
            };
            tokens.insert(grant.token, identity);
        }

        Self {
            grants: tokens,
            rooms,
        }
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

#[async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<Identity, AuthError> {
        self.grants
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }

    async fn authorize_room(&self, identity: &Identity, room_id: &RoomId) -> Result<(), AuthError> {
        match self.rooms.get(&identity.user_id) {
            Some(allowed) if !allowed.contains(room_id) => {
                Err(AuthError::RoomForbidden(room_id.clone()))
            }
            _ => Ok(()),
        }
    }
}

/// Token from `Authorization: Bearer ...`, falling back to the `token` query
/// parameter browsers use because they cannot set headers on a WebSocket.
pub fn extract_token(headers: &HeaderMap, query_token: Option<&str>) -> Result<String, AuthError> {
    let from_header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    from_header
        .or(query_token.map(str::trim).filter(|token| !token.is_empty()))
        .map(str::to_owned)
        .ok_or(AuthError::MissingToken)
}
