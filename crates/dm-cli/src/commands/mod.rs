//! Command implementations for dm-cli

pub mod config;
pub mod content;
pub mod install;
pub mod meta;
pub mod remote;
pub mod setup;
pub mod status;
pub mod tree;

pub use config::{run_config_show, run_set_defaults, run_set_remote};
pub use content::{run_drop, run_get, run_remove, run_save};
pub use install::{InstallArgs, run_install};
pub use meta::{run_meta_get, run_meta_set};
pub use remote::{PublishArgs, run_clone, run_publish, run_pull, run_push, run_siblings_list, run_siblings_remove};
pub use setup::{SetupArgs, run_setup};
pub use status::{run_classify, run_status};
pub use tree::{run_create, run_init_tree};

use serde_json::{Map, Value};

use crate::error::{CliError, Result};

/// Parse a JSON object given on the command line.
pub fn parse_json_object(text: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        other => Err(CliError::user(format!(
            "Expected a JSON object, got: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_objects_only() {
        let map = parse_json_object(r#"{"instrument": "NR"}"#).unwrap();
        assert_eq!(map["instrument"], "NR");
        assert!(matches!(parse_json_object("[1, 2]"), Err(CliError::User { .. })));
        assert!(matches!(parse_json_object("{oops"), Err(CliError::Json(_))));
    }
}
