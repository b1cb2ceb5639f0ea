pub mod auth;
pub mod checkins;
pub mod health;
pub mod matches;
pub mod profile;
pub mod venues;
