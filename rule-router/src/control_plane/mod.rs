//! Rule-set intake: file loading and structural validation.

mod loader;
mod validator;

pub use loader::{load_rules_dir, load_rules_file};
pub use validator::{validate_rule, validate_rules};
