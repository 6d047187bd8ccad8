pub mod jobs;
pub mod league;
pub mod logging;
pub mod scheduler;
pub mod settings;
pub mod team_directory;

pub use settings::Settings;
