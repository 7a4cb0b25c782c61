//! Record of deployed workers
//!
//! Written automatically after a successful `workers deploy`. Only version 0
//! exists so far, so the migration chain is empty.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::Result;
use crate::fs::ConfigFs;
use crate::kind::ConfigKind;
use crate::paths::ConfigLocation;
use crate::store::{ConfigStore, ReadonlyConfig};

use super::TOP_LEVEL_SCHEMA_ID;

pub const KIND: &str = "deployed";
pub const FILE_NAME: &str = "deployed.yaml";

/// Latest typed shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedConfig {
    pub version: u32,
    #[serde(default)]
    pub workers: Vec<DeployedWorker>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedWorker {
    pub name: String,
    pub installation_spells: Vec<InstallationSpell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationSpell {
    pub host_id: String,
    pub spell_id: String,
    pub worker_id: String,
}

fn schema_v0() -> Value {
    json!({
        "$id": format!("{TOP_LEVEL_SCHEMA_ID}/{FILE_NAME}"),
        "title": FILE_NAME,
        "type": "object",
        "description": "A result of app deployment. This file is created automatically after successful deployment using `fluence workers deploy` command",
        "properties": {
            "version": { "type": "number", "const": 0 },
            "workers": {
                "type": "array",
                "description": "A list of deployed workers",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "installation_spells": {
                            "type": "array",
                            "description": "A list of installation spells",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "host_id": { "type": "string" },
                                    "spell_id": { "type": "string" },
                                    "worker_id": { "type": "string" }
                                },
                                "required": ["host_id", "spell_id", "worker_id"]
                            }
                        }
                    },
                    "required": ["name", "installation_spells"]
                }
            }
        },
        "required": ["version"]
    })
}

/// Schema content of the latest version
pub fn latest_schema() -> Value {
    schema_v0()
}

pub fn kind() -> Result<ConfigKind> {
    ConfigKind::builder(KIND, FILE_NAME)
        .location(ConfigLocation::Project)
        .schema(0, schema_v0())
        .latest(latest_schema())
        .build()
}

/// Load the existing record; `NotFound` if nothing was deployed yet
pub fn init_readonly<F: ConfigFs>(store: &ConfigStore<F>) -> Result<ReadonlyConfig> {
    store.load_readonly(KIND)
}

/// Load the record, creating it with `workers` if it does not exist
pub fn init_new_readonly<F: ConfigFs>(
    store: &ConfigStore<F>,
    workers: Vec<DeployedWorker>,
) -> Result<ReadonlyConfig> {
    store.load_readonly_or_init(KIND, || {
        json!({
            "version": 0,
            "workers": workers,
        })
    })
}
