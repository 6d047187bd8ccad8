mod settings;

pub use settings::OAuthSettings;
