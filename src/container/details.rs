//! Inspected container details
//!
//! `docker inspect` and `podman inspect` disagree on a few shapes: Docker
//! prints `Entrypoint` as a list and `ExposedPorts`/`PortBindings` as maps
//! keyed by port, some Podman versions print `Entrypoint` as a plain string,
//! and both print `null` for empty lists. The helpers in [`de`] fold these
//! into the flat types used for `create`.

use super::config::{ContainerConfig, ContainerHostConfig};
use serde::{Deserialize, Serialize};

/// Read-only view of a container, decoded from inspect output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerDetails {
    #[serde(rename = "Id", alias = "ID")]
    pub id: String,
    pub name: String,
    pub image: String,
    pub path: String,
    #[serde(deserialize_with = "de::nullable")]
    pub args: Vec<String>,
    #[serde(deserialize_with = "de::nullable")]
    pub config: ContainerConfig,
    #[serde(deserialize_with = "de::nullable")]
    pub host_config: ContainerHostConfig,
}

/// Selected details of a container, for test logs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerDetailsLogging {
    pub id: String,
    pub name: String,
    pub image: String,
    pub path: String,
    pub args: Vec<String>,
    pub cap_add: Vec<String>,
    pub cap_drop: Vec<String>,
    pub user: String,
    pub env: Vec<String>,
}

impl ContainerDetailsLogging {
    /// Pick the logged fields out of `details`
    pub fn from_details(id: &str, details: &ContainerDetails) -> Self {
        Self {
            id: id.to_string(),
            name: details.name.clone(),
            image: details.image.clone(),
            path: details.path.clone(),
            args: details.args.clone(),
            cap_add: details.host_config.cap_add.clone(),
            cap_drop: details.host_config.cap_drop.clone(),
            user: details.config.user.clone(),
            env: details.config.env.clone(),
        }
    }
}

pub(crate) mod de {
    use crate::container::config::PortBinding;
    use serde::de::IgnoredAny;
    use serde::{Deserialize, Deserializer};
    use std::collections::BTreeMap;

    /// `null` decodes as the default value
    pub fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    /// A string, a list of strings, or `null`
    pub fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
            None => Vec::new(),
            Some(OneOrMany::One(value)) if value.is_empty() => Vec::new(),
            Some(OneOrMany::One(value)) => vec![value],
            Some(OneOrMany::Many(values)) => values,
        })
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SeqOrMap {
        Seq(Vec<String>),
        Map(BTreeMap<String, IgnoredAny>),
    }

    /// A list of strings, or a map whose keys are the values
    pub fn seq_or_map_keys<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<SeqOrMap>::deserialize(deserializer)? {
            None => Vec::new(),
            Some(SeqOrMap::Seq(values)) => values,
            Some(SeqOrMap::Map(map)) => map.into_keys().collect(),
        })
    }

    #[derive(Deserialize)]
    struct HostBinding {
        #[serde(rename = "HostIp", alias = "HostIP", default)]
        host_ip: String,
        #[serde(rename = "HostPort", default)]
        host_port: String,
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Bindings {
        Seq(Vec<PortBinding>),
        Map(BTreeMap<String, Option<Vec<HostBinding>>>),
    }

    /// A list of bindings, or Docker's `{"1414/tcp": [{"HostIp": .., "HostPort": ..}]}`
    pub fn port_bindings<'de, D>(deserializer: D) -> Result<Vec<PortBinding>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Bindings>::deserialize(deserializer)? {
            None => Vec::new(),
            Some(Bindings::Seq(bindings)) => bindings,
            Some(Bindings::Map(map)) => map
                .into_iter()
                .flat_map(|(container_port, hosts)| {
                    hosts
                        .unwrap_or_default()
                        .into_iter()
                        .map(move |host| PortBinding {
                            host_ip: host.host_ip,
                            host_port: host.host_port,
                            container_port: container_port.clone(),
                        })
                })
                .collect(),
        })
    }
}
