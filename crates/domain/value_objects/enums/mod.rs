pub mod app_roles;
pub mod function_actions;
pub mod report_enums;
pub mod settings_enums;
