mod models;

pub use models::{Credential, TokenSet};
