mod engine;
mod ticker;

pub use engine::{AutoBehavior, TimerEngine};
pub use ticker::{Ticker, TickerHandle};
