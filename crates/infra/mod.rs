pub mod db;
pub mod realtime;
pub mod storages;
pub mod supabase;
