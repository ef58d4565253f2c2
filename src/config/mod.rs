pub mod account;
pub mod settings;

pub use account::AccountConfig;
pub use settings::Settings;
