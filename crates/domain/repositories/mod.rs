pub mod auth_gateway;
pub mod follows;
pub mod gift_transactions;
pub mod gifts;
pub mod live_streams;
pub mod messages;
pub mod profiles;
pub mod reports;
pub mod stream_chat;
pub mod storage;
pub mod user_roles;
pub mod user_settings;
pub mod videos;
