pub mod event;
pub mod level;
pub mod resolve;
pub mod step;
pub mod world;
