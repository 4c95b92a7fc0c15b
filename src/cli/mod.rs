mod args;
mod config;

pub use args::{Args, ClassifyArgs, Command, InitArgs, ServeArgs};
pub use config::{BlightcheckConfig, InferenceConfig, UiConfig};
