mod engine;
mod mode;
pub mod service;
mod session;

pub use engine::TimerEngine;
pub use mode::{TimerMode, TimerSettings, TimerStatus};
pub use service::TimerService;
pub use session::TimerSession;
