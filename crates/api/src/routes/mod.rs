pub mod health;
pub mod player;
