pub mod animation_handler;
pub mod lock_helpers;

pub use animation_handler::AnimationHandler;
