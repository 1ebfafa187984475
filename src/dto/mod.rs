/// Health check body.
pub mod health;
/// List screen bodies.
pub mod matches;
/// Media screen bodies.
pub mod media;
/// Detail screen bodies.
pub mod results;
/// Login and navigation bodies.
pub mod session;
pub mod validation;
