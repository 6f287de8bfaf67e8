pub mod error;
pub mod resolver;
pub mod value_parser;

pub use error::LimitsError;
pub use resolver::{
    PluginConfig, SoftwareLimits, extract_plugins, resolve_reference, resolve_software_limits,
};
pub use value_parser::{ConfigDocument, ConfigValue, ParsedValue, parse_str, parse_value};
