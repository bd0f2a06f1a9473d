pub mod admin;
pub mod auth;
pub mod creator;
pub mod functions;
pub mod gifts;
pub mod live_streams;
pub mod messages;
pub mod profiles;
pub mod reports;
pub mod settings;
pub mod videos;
pub mod view_socket;
