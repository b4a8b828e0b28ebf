use std::collections::VecDeque;
use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use tether_core::{ClientId, RobotIdentifyPayload, ServerMessage, SetAnglesPayload};

use super::{ClientError, Engine};

impl Engine {
    /// Robot authentication. Every check must pass before any state moves:
    /// all four fields present, the space known, the robot on the space's
    /// allow list, the secret right (constant-time), the space's robot slot
    /// free, and the space itself willing to admit one more participant.
    pub(crate) fn on_robot_identify(&mut self, client_id: ClientId, payload: RobotIdentifyPayload) {
        let fields = (
            payload.robot_id.filter(|s| !s.is_empty()),
            payload.robot_name.filter(|s| !s.is_empty()),
            payload.space.filter(|s| !s.is_empty()),
            payload.secret_key.filter(|s| !s.is_empty()),
        );
        let (Some(robot_id), Some(robot_name), Some(space_id), Some(secret_key)) = fields else {
            self.reject(client_id, ClientError::IncompleteRobotIdentity);
            return;
        };

        let catalog = Arc::clone(&self.catalog);
        let Some(entry) = catalog.get(&space_id) else {
            self.reject(client_id, ClientError::UnknownSpaceForRobot(space_id));
            return;
        };
        if !entry.robot_ids.iter().any(|id| *id == robot_id) {
            warn!(
                robot_id = %robot_id,
                space = %space_id,
                "robot authentication failed: not in space's allowed list"
            );
            self.reject(client_id, ClientError::RobotNotAuthorized { robot_id, space_id });
            return;
        }
        if !self.secrets.verify(&robot_id, &secret_key) {
            warn!(robot_id = %robot_id, "robot authentication failed: invalid secret key");
            self.reject(client_id, ClientError::InvalidRobotCredentials);
            return;
        }
        if self.registry.find_robot_in_space(&space_id).is_some() {
            self.reject(client_id, ClientError::RobotAlreadyPresent(space_id));
            return;
        }

        let participants = match self.admit_to_space(client_id, &space_id) {
            Ok(participants) => participants,
            Err(error) => {
                self.reject(client_id, error);
                return;
            }
        };
        self.registry
            .register_robot(client_id, &robot_id, &robot_name, &space_id);
        info!(
            robot_id = %robot_id,
            robot_name = %robot_name,
            space = %space_id,
            "robot authenticated and joined space"
        );

        self.outbox.send(
            client_id,
            &ServerMessage::JoinedSpace {
                space: space_id.clone(),
                participants: participants.clone(),
                is_robot: Some(true),
                robot_id: Some(robot_id.clone()),
                robot_name: Some(robot_name.clone()),
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
        self.broadcast(
            &space_id,
            &ServerMessage::RobotJoined {
                robot_id,
                robot_name,
                client_id,
            },
            Some(client_id),
        );

        // Controllers may have queued up while the robot was offline.
        if self.registry.controller_of(&client_id).is_none() {
            self.promote_next(client_id, &space_id);
        }
    }

    /// A human asks for the control lease. They end up as either the
    /// controller or the tail of exactly one queue.
    pub(crate) fn on_control_request(&mut self, client_id: ClientId) {
        let Some(space_id) = self.registry.space_of(&client_id).map(str::to_owned) else {
            self.reject(client_id, ClientError::NotInSpace);
            return;
        };
        // A robot asking for its own lease would end up controlling itself.
        if self.registry.is_robot(&client_id) {
            self.reject(client_id, ClientError::RobotRequester);
            return;
        }

        let Some(robot_client_id) = self.registry.find_robot_in_space(&space_id) else {
            // No robot yet: hold the requester's place in line.
            let position = self.enqueue_waiter(&space_id, client_id);
            self.outbox
                .send(client_id, &ServerMessage::ControlPending { position });
            return;
        };

        if self.registry.find_robot_controlled_by(&client_id).is_some() {
            self.reject(client_id, ClientError::AlreadyController);
            return;
        }

        self.registry.register_human(&client_id);

        if let Some(position) = self.queue_position(&space_id, client_id) {
            self.outbox
                .send(client_id, &ServerMessage::ControlPending { position });
            return;
        }

        let queue_empty = self
            .control_queues
            .get(&space_id)
            .is_none_or(VecDeque::is_empty);
        if self.registry.controller_of(&robot_client_id).is_none() && queue_empty {
            info!(%client_id, robot = %robot_client_id, "granting control");
            self.grant_control(robot_client_id, client_id);
            return;
        }

        let position = self.enqueue_waiter(&space_id, client_id);
        self.outbox
            .send(client_id, &ServerMessage::ControlPending { position });
    }

    /// Release, from either side of the lease. A robot releasing drops its
    /// current controller; a controller releasing frees the robot. Both
    /// promote the next waiter. A queued human releasing just leaves the
    /// line.
    pub(crate) fn on_control_release(&mut self, client_id: ClientId) {
        if self.registry.is_robot(&client_id) {
            let space_id = self
                .registry
                .robot_profile(&client_id)
                .map(|profile| profile.space.clone());
            if let Some(controller_id) = self.registry.controller_of(&client_id) {
                self.registry.set_controller(&client_id, None);
                info!(robot = %client_id, controller = %controller_id, "robot released control");
                self.outbox.send(
                    controller_id,
                    &ServerMessage::control_released_to_controller(client_id, None),
                );
            }
            if let Some(space_id) = space_id {
                self.promote_next(client_id, &space_id);
            }
        } else {
            self.dequeue_waiter(client_id);
            if let Some(robot_client_id) = self.registry.find_robot_controlled_by(&client_id) {
                let space_id = self
                    .registry
                    .robot_profile(&robot_client_id)
                    .map(|profile| profile.space.clone());
                self.registry.set_controller(&robot_client_id, None);
                info!(controller = %client_id, robot = %robot_client_id, "controller released control");
                self.outbox.send(
                    robot_client_id,
                    &ServerMessage::control_released_to_robot(client_id, None),
                );
                // Acknowledge to the releaser as well, so its UI can drop
                // the control surface without waiting on the robot.
                self.outbox.send(
                    client_id,
                    &ServerMessage::control_released_to_controller(robot_client_id, None),
                );
                if let Some(space_id) = space_id {
                    self.promote_next(robot_client_id, &space_id);
                }
            }
        }
    }

    /// Grants are an internal transition only. A client sending one gets an
    /// error and a high-severity log entry; state never moves.
    pub(crate) fn on_spoofed_grant(&mut self, client_id: ClientId, payload: Value) {
        error!(%client_id, payload = %payload, "rejected unauthorized client-sent control_granted");
        self.reject(client_id, ClientError::UnauthorizedGrant);
    }

    /// Forward a pose command to a robot, but only from its current
    /// controller.
    pub(crate) fn on_set_angles(&mut self, client_id: ClientId, payload: SetAnglesPayload) {
        let robot_client_id = payload
            .robot_id
            .as_deref()
            .and_then(|id| id.parse::<ClientId>().ok())
            .filter(|id| self.registry.is_robot(id));
        let Some(robot_client_id) = robot_client_id else {
            self.reject(client_id, ClientError::InvalidRobotId);
            return;
        };
        let Some(angles) = payload.angles else {
            self.reject(client_id, ClientError::MissingAngles);
            return;
        };
        if self.registry.controller_of(&robot_client_id) != Some(client_id) {
            self.reject(client_id, ClientError::NotController);
            return;
        }
        self.outbox
            .send(robot_client_id, &ServerMessage::SetAngles { angles });
    }

    /// Robot side of the disconnect cascade: the current controller and
    /// every queued waiter learn the robot is gone, and the queue dies with
    /// it.
    pub(crate) fn on_robot_disconnect(&mut self, client_id: ClientId) {
        let Some(profile) = self.registry.robot_profile(&client_id).cloned() else {
            return;
        };
        info!(robot_name = %profile.robot_name, %client_id, "robot disconnected");

        if let Some(controller_id) = profile.controlled_by {
            self.registry.set_controller(&client_id, None);
            self.outbox.send(
                controller_id,
                &ServerMessage::control_released_to_controller(
                    client_id,
                    Some("Robot disconnected"),
                ),
            );
        }
        if let Some(queue) = self.control_queues.remove(&profile.space) {
            for waiter in queue {
                self.outbox.send(
                    waiter,
                    &ServerMessage::control_released_to_controller(
                        client_id,
                        Some("Robot disconnected"),
                    ),
                );
            }
        }
    }

    /// Human side of the disconnect cascade: leave any queue, and if the
    /// client held a lease, free the robot and promote the next waiter.
    pub(crate) fn on_human_disconnect(&mut self, client_id: ClientId) {
        if !self.registry.is_human(&client_id) {
            return;
        }
        self.dequeue_waiter(client_id);

        if let Some(robot_client_id) = self.registry.find_robot_controlled_by(&client_id) {
            let space_id = self
                .registry
                .robot_profile(&robot_client_id)
                .map(|profile| profile.space.clone());
            self.registry.set_controller(&robot_client_id, None);
            self.outbox.send(
                robot_client_id,
                &ServerMessage::control_released_to_robot(
                    client_id,
                    Some("Controller disconnected"),
                ),
            );
            if let Some(space_id) = space_id {
                self.promote_next(robot_client_id, &space_id);
            }
        }
    }

    /// Append to the space's FIFO queue (no-op if already waiting) and
    /// return the 1-based position.
    fn enqueue_waiter(&mut self, space_id: &str, client_id: ClientId) -> usize {
        let queue = self.control_queues.entry(space_id.to_string()).or_default();
        match queue.iter().position(|waiter| *waiter == client_id) {
            Some(index) => index + 1,
            None => {
                queue.push_back(client_id);
                queue.len()
            }
        }
    }

    fn queue_position(&self, space_id: &str, client_id: ClientId) -> Option<usize> {
        self.control_queues
            .get(space_id)?
            .iter()
            .position(|waiter| *waiter == client_id)
            .map(|index| index + 1)
    }

    /// Remove the client from whichever queue holds it, dropping queues
    /// that empty out.
    fn dequeue_waiter(&mut self, client_id: ClientId) {
        self.control_queues.retain(|_, queue| {
            queue.retain(|waiter| *waiter != client_id);
            !queue.is_empty()
        });
    }

    fn grant_control(&mut self, robot_client_id: ClientId, controller_id: ClientId) {
        self.registry
            .set_controller(&robot_client_id, Some(controller_id));
        self.registry.register_human(&controller_id);
        let robot_name = self
            .registry
            .robot_profile(&robot_client_id)
            .map(|profile| profile.robot_name.clone())
            .unwrap_or_else(|| "Unknown".to_string());
        self.outbox.send(
            controller_id,
            &ServerMessage::ControlGranted {
                robot_id: robot_client_id,
                robot_name,
            },
        );
    }

    /// Pop waiters until one is still connected and grant it the lease.
    /// Liveness is re-checked on every pop; the queue object is dropped
    /// once drained.
    pub(crate) fn promote_next(&mut self, robot_client_id: ClientId, space_id: &str) {
        while let Some(next) = self
            .control_queues
            .get_mut(space_id)
            .and_then(|queue| queue.pop_front())
        {
            if self.registry.contains(&next) {
                info!(controller = %next, robot = %robot_client_id, "promoting queued controller");
                self.grant_control(robot_client_id, next);
                break;
            }
        }
        if self
            .control_queues
            .get(space_id)
            .is_some_and(VecDeque::is_empty)
        {
            self.control_queues.remove(space_id);
        }
    }
}
