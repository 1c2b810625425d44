pub mod board;
pub mod entity;
pub mod tile;
pub mod vision;
