use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;

use tether_core::{ClientId, JoinSpacePayload, ServerMessage};

use super::{ClientError, Engine};

impl Engine {
    pub(crate) fn on_join_space(&mut self, client_id: ClientId, payload: JoinSpacePayload) {
        let Some(space_id) = payload.space.filter(|s| !s.is_empty()) else {
            self.reject(client_id, ClientError::SpaceIdRequired);
            return;
        };

        match self.admit_to_space(client_id, &space_id) {
            Ok(participants) => {
                self.outbox.send(
                    client_id,
                    &ServerMessage::JoinedSpace {
                        space: space_id.clone(),
                        participants: participants.clone(),
                        is_robot: None,
                        robot_id: None,
                        robot_name: None,
                    },
                );
                self.broadcast(
                    &space_id,
                    &ServerMessage::UserJoined {
                        sid: client_id,
                        participants,
                    },
                    Some(client_id),
                );
            }
            Err(error) => self.reject(client_id, error),
        }
    }

    /// Validate and perform space admission: the space must exist, be
    /// enabled, and have a seat free. Emits nothing; callers own the join
    /// announcements so the robot path can shape its own. Returns the
    /// membership after insertion.
    pub(crate) fn admit_to_space(
        &mut self,
        client_id: ClientId,
        space_id: &str,
    ) -> Result<Vec<ClientId>, ClientError> {
        let catalog = Arc::clone(&self.catalog);
        let entry = catalog
            .get(space_id)
            .ok_or_else(|| ClientError::UnknownSpace(space_id.to_string()))?;
        if !entry.enabled {
            return Err(ClientError::SpaceUnavailable(entry.display_name.clone()));
        }
        let occupancy = self.active_spaces.get(space_id).map_or(0, HashSet::len);
        if occupancy >= entry.max_participants as usize {
            return Err(ClientError::SpaceFull(entry.max_participants));
        }

        // A client is in at most one space; switching leaves the old one.
        if self.registry.space_of(&client_id).is_some() {
            self.on_leave_space(client_id);
        }

        let members = self.active_spaces.entry(space_id.to_string()).or_default();
        members.insert(client_id);
        let participants: Vec<ClientId> = members.iter().copied().collect();
        self.registry.set_space(&client_id, Some(space_id.to_string()));

        info!(%client_id, space = space_id, display_name = %entry.display_name, "client joined space");
        Ok(participants)
    }

    /// Remove the client from its active space, tell the remaining members,
    /// and tear the space down if it emptied. Idempotent.
    pub(crate) fn on_leave_space(&mut self, client_id: ClientId) {
        let Some(space_id) = self.registry.space_of(&client_id).map(str::to_owned) else {
            return;
        };

        if let Some(members) = self.active_spaces.get_mut(&space_id) {
            members.remove(&client_id);
        }
        self.broadcast(
            &space_id,
            &ServerMessage::UserLeft { sid: client_id },
            Some(client_id),
        );
        if self
            .active_spaces
            .get(&space_id)
            .is_some_and(HashSet::is_empty)
        {
            self.active_spaces.remove(&space_id);
        }

        self.registry.set_space(&client_id, None);
        info!(%client_id, space = %space_id, "client left space");
    }

    /// Best-effort send to every member of a space except `exclude`.
    pub(crate) fn broadcast(
        &self,
        space_id: &str,
        message: &ServerMessage,
        exclude: Option<ClientId>,
    ) {
        let Some(members) = self.active_spaces.get(space_id) else {
            return;
        };
        for member in members {
            if Some(*member) != exclude {
                self.outbox.send(*member, message);
            }
        }
    }
}
