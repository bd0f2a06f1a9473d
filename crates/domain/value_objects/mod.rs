pub mod conversations;
pub mod enums;
pub mod function_payloads;
pub mod metrics;
pub mod validation;
