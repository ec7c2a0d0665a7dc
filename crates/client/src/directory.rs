//! Roles and tracks. Geofenced tracks double as check-in zones.

use domain::models::user::{CreateRoleRequest, RoleEntry};
use domain::models::zone::CreateTrackRequest;
use domain::models::{Session, Track, Zone};
use tracing::debug;
use validator::Validate;

use crate::error::ClientError;
use crate::http::ApiClient;

impl ApiClient {
    pub async fn list_roles(&self, session: &Session) -> Result<Vec<RoleEntry>, ClientError> {
        self.get("roles.list", "/roles/roles", session).await
    }

    pub async fn create_role(
        &self,
        request: &CreateRoleRequest,
        session: &Session,
    ) -> Result<Option<String>, ClientError> {
        if !session.is_admin() {
            return Err(ClientError::AdminRequired);
        }
        request.validate()?;
        self.post_ack("roles.create", "/roles/role", request, Some(session))
            .await
    }

    pub async fn list_tracks(&self, session: &Session) -> Result<Vec<Track>, ClientError> {
        self.get("tracks.list", "/tracks/tracks", session).await
    }

    pub async fn create_track(
        &self,
        request: &CreateTrackRequest,
        session: &Session,
    ) -> Result<Option<String>, ClientError> {
        if !session.is_admin() {
            return Err(ClientError::AdminRequired);
        }
        request.validate()?;
        self.post_ack("tracks.create", "/tracks/track", request, Some(session))
            .await
    }

    /// Zones derived from the geofenced tracks.
    pub async fn remote_zones(&self, session: &Session) -> Result<Vec<Zone>, ClientError> {
        let tracks = self.list_tracks(session).await?;
        Ok(zones_from_tracks(&tracks))
    }
}

/// Converts tracks to zones, skipping tracks without a usable geofence.
pub fn zones_from_tracks(tracks: &[Track]) -> Vec<Zone> {
    tracks
        .iter()
        .filter_map(|track| {
            let zone = track.to_zone();
            if zone.is_none() {
                debug!(track_id = %track.id, "Skipping track without a valid geofence");
            }
            zone
        })
        .collect()
}
