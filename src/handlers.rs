pub mod health;
pub mod movements;
pub mod supplies;
pub mod tools;
