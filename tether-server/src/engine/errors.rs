use thiserror::Error;

/// Client-visible rejections. Each one is surfaced to the offending client
/// as a single `error {message}` frame; the connection stays open.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("Space ID is required")]
    SpaceIdRequired,
    #[error("Space '{0}' does not exist. Please select a valid space.")]
    UnknownSpace(String),
    #[error("Space '{0}' is currently unavailable.")]
    SpaceUnavailable(String),
    #[error("Space is full. Maximum {0} participants allowed.")]
    SpaceFull(u32),
    #[error("Robot identification requires robot_id, robot_name, space, and secret_key")]
    IncompleteRobotIdentity,
    #[error("Space '{0}' does not exist")]
    UnknownSpaceForRobot(String),
    #[error("Robot '{robot_id}' is not authorized to access space '{space_id}'")]
    RobotNotAuthorized { robot_id: String, space_id: String },
    #[error("Invalid robot credentials")]
    InvalidRobotCredentials,
    #[error("Space '{0}' already has an active robot")]
    RobotAlreadyPresent(String),
    #[error("You must join a space first")]
    NotInSpace,
    #[error("Robots cannot request control")]
    RobotRequester,
    #[error("You already control a robot")]
    AlreadyController,
    #[error("Invalid robot_id")]
    InvalidRobotId,
    #[error("angles data is required")]
    MissingAngles,
    #[error("You do not control this robot")]
    NotController,
    #[error("You do not currently control this robot")]
    NotActiveController,
    #[error("No robot is connected in this space")]
    NoRobotInSpace,
    #[error("Only robot clients can send control answers")]
    NotARobot,
    #[error("Unauthorized control_granted message rejected")]
    UnauthorizedGrant,
}
