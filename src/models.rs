pub mod item;
pub mod movement;
pub mod supply;
pub mod tool;
