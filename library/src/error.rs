use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Slot {slot_id} holds a {type_name} value, which cannot be animated")]
    UnsupportedType { slot_id: Uuid, type_name: String },
    #[error("Input {slot_id} of instance {instance_id} is already animated")]
    AlreadyAnimated { instance_id: Uuid, slot_id: Uuid },
    #[error("Input {slot_id} of instance {instance_id} is not animated")]
    NotAnimated { instance_id: Uuid, slot_id: Uuid },
    #[error("Corrupt animation binding for input {slot_id} of instance {instance_id}: {reason}")]
    Corruption {
        instance_id: Uuid,
        slot_id: Uuid,
        reason: String,
    },
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),
    #[error("Instance {0} not found")]
    UnknownInstance(Uuid),
    #[error("Slot {slot_id} not found on instance {instance_id}")]
    UnknownSlot { instance_id: Uuid, slot_id: Uuid },
    #[error("Lock Poisoned")]
    LockPoisoned,
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

