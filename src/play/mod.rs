//! 跟踪回放

mod player;

pub use player::{PlayerState, TracePlayer, SPEEDS};
