use std::collections::HashMap;

use tether_core::{ClientId, ClientRole};

/// Identity a client earns by authenticating as a robot.
#[derive(Debug, Clone)]
pub struct RobotProfile {
    pub robot_id: String,
    pub robot_name: String,
    pub space: String,
    pub controlled_by: Option<ClientId>,
}

#[derive(Debug, Default)]
struct ClientEntry {
    role: ClientRole,
    space: Option<String>,
}

/// Authoritative index of live connections: who is connected, what role
/// they hold, which space they are in, and which robot each controller is
/// bound to. All mutation happens under the engine lock.
///
/// Controller-of and controlled-by are expressed as id lookups on the robot
/// profile, never as references between clients.
#[derive(Debug, Default)]
pub struct Registry {
    clients: HashMap<ClientId, ClientEntry>,
    robots: HashMap<ClientId, RobotProfile>,
}

impl Registry {
    pub fn add(&mut self, client_id: ClientId) {
        self.clients.insert(client_id, ClientEntry::default());
    }

    pub fn contains(&self, client_id: &ClientId) -> bool {
        self.clients.contains_key(client_id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn space_of(&self, client_id: &ClientId) -> Option<&str> {
        self.clients.get(client_id).and_then(|c| c.space.as_deref())
    }

    pub fn set_space(&mut self, client_id: &ClientId, space: Option<String>) {
        if let Some(entry) = self.clients.get_mut(client_id) {
            entry.space = space;
        }
    }

    pub fn register_robot(
        &mut self,
        client_id: ClientId,
        robot_id: &str,
        robot_name: &str,
        space: &str,
    ) {
        if let Some(entry) = self.clients.get_mut(&client_id) {
            entry.role = ClientRole::Robot;
        }
        self.robots.insert(
            client_id,
            RobotProfile {
                robot_id: robot_id.to_string(),
                robot_name: robot_name.to_string(),
                space: space.to_string(),
                controlled_by: None,
            },
        );
    }

    /// Mark a client as human. Robots keep their role; humans stay human.
    pub fn register_human(&mut self, client_id: &ClientId) {
        if let Some(entry) = self.clients.get_mut(client_id) {
            if entry.role == ClientRole::Unknown {
                entry.role = ClientRole::Human;
            }
        }
    }

    pub fn is_robot(&self, client_id: &ClientId) -> bool {
        self.robots.contains_key(client_id)
    }

    pub fn is_human(&self, client_id: &ClientId) -> bool {
        self.clients
            .get(client_id)
            .is_some_and(|entry| entry.role == ClientRole::Human)
    }

    pub fn robot_profile(&self, client_id: &ClientId) -> Option<&RobotProfile> {
        self.robots.get(client_id)
    }

    pub fn set_controller(&mut self, robot_client_id: &ClientId, controller: Option<ClientId>) {
        if let Some(profile) = self.robots.get_mut(robot_client_id) {
            profile.controlled_by = controller;
        }
    }

    pub fn controller_of(&self, robot_client_id: &ClientId) -> Option<ClientId> {
        self.robots
            .get(robot_client_id)
            .and_then(|profile| profile.controlled_by)
    }

    pub fn find_robot_controlled_by(&self, controller_id: &ClientId) -> Option<ClientId> {
        self.robots
            .iter()
            .find(|(_, profile)| profile.controlled_by == Some(*controller_id))
            .map(|(id, _)| *id)
    }

    pub fn find_robot_in_space(&self, space_id: &str) -> Option<ClientId> {
        self.robots
            .iter()
            .find(|(_, profile)| profile.space == space_id)
            .map(|(id, _)| *id)
    }

    /// Remove the client from every index. Idempotent; emits nothing,
    /// notification is the disconnect cascade's job.
    pub fn cleanup(&mut self, client_id: &ClientId) {
        self.clients.remove(client_id);
        self.robots.remove(client_id);
    }
}
