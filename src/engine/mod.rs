pub mod context;
pub mod cost;
pub mod notify;
pub mod optimizer;
pub mod sequencer;
pub mod tracking;
