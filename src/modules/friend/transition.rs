use uuid::Uuid;

use crate::{
    api::error,
    modules::friend::schema::{FriendshipEntity, FriendshipStatus},
};

/// The transitions a caller can request on a friendship record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Accept,
    Decline,
    Cancel,
    Remove,
}

/// The actor's relation to the record. Authorization is decided on the
/// role, never on the raw user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRole {
    Requester,
    Receiver,
    Outsider,
}

impl ActorRole {
    pub fn of(actor: &Uuid, friendship: &FriendshipEntity) -> Self {
        if friendship.requester_id == *actor {
            ActorRole::Requester
        } else if friendship.receiver_id == *actor {
            ActorRole::Receiver
        } else {
            ActorRole::Outsider
        }
    }
}

/// What a permitted transition does to the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    SetStatus(FriendshipStatus),
    Delete,
}

/// Single transition table for every (status, action, role) combination.
///
/// Authorization is checked before the state precondition, so a wrong
/// actor gets Forbidden whatever the record's status. Accept and decline
/// only move out of `Pending`; an already-settled request is a Conflict.
pub fn apply(
    status: FriendshipStatus,
    action: Action,
    role: ActorRole,
) -> Result<Effect, error::ServiceError> {
    use FriendshipStatus::*;

    match action {
        Action::Accept => {
            if role != ActorRole::Receiver {
                return Err(error::ServiceError::forbidden(
                    "You are not allowed to accept this friend request",
                ));
            }
            match status {
                Pending => Ok(Effect::SetStatus(Accepted)),
                Accepted => {
                    Err(error::ServiceError::conflict("Friend request already accepted"))
                }
                Rejected => {
                    Err(error::ServiceError::conflict("Friend request already declined"))
                }
            }
        }
        Action::Decline => {
            if role != ActorRole::Receiver {
                return Err(error::ServiceError::forbidden(
                    "You are not allowed to decline this friend request",
                ));
            }
            match status {
                Pending => Ok(Effect::SetStatus(Rejected)),
                Accepted => {
                    Err(error::ServiceError::conflict("Friend request already accepted"))
                }
                Rejected => {
                    Err(error::ServiceError::conflict("Friend request already declined"))
                }
            }
        }
        Action::Cancel => {
            if role != ActorRole::Requester {
                return Err(error::ServiceError::forbidden(
                    "You are not allowed to cancel this friend request",
                ));
            }
            match status {
                Pending => Ok(Effect::Delete),
                _ => Err(error::ServiceError::conflict("Only pending requests can be canceled")),
            }
        }
        Action::Remove => {
            if role == ActorRole::Outsider {
                return Err(error::ServiceError::forbidden(
                    "You are not part of this friendship",
                ));
            }
            match status {
                Accepted => Ok(Effect::Delete),
                _ => Err(error::ServiceError::conflict("Not an accepted friendship")),
            }
        }
    }
}
