//! Built-in resolver adapters.

mod command;
mod http_json;
mod os_release;

pub use command::{CommandResolver, SOURCE_PLACEHOLDER};
pub use http_json::{DEFAULT_POINTER, HttpJsonResolver, extract_versions};
pub use os_release::{DEFAULT_PATHS, OsReleaseResolver, parse_os_release};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Deserialize a resolver's free-form `options` object.
pub(crate) fn parse_options<T: DeserializeOwned>(
    options: &Map<String, Value>,
) -> Result<T, String> {
    serde_json::from_value(Value::Object(options.clone())).map_err(|e| e.to_string())
}
