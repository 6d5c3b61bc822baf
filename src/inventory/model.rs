//! Snapshot of the workload inventory.
//!
//! JSON shape (field names follow the Docker Engine API summaries):
//! {
//!   "containers": [
//!     {
//!       "Id": "4c01db0b339c",
//!       "Names": ["/whoami"],
//!       "Image": "jwilder/whoami",
//!       "Labels": { "caddy.address": "whoami.example.com", ... },
//!       "NetworkSettings": {
//!         "Networks": { "caddy": { "NetworkID": "n1", "IPAddress": "10.0.0.2" } }
//!       }
//!     }
//!   ],
//!   "services": [
//!     {
//!       "ID": "x1y2",
//!       "Spec": { "Name": "api", "Labels": { ... } },
//!       "Endpoint": { "VirtualIPs": [ { "NetworkID": "n1", "Addr": "10.0.0.5/24" } ] }
//!     }
//!   ],
//!   "networks": [ { "Id": "n1", "Name": "caddy", "Ingress": false } ],
//!   "proxy_networks": ["n1"]          // optional, skips discovery
//! }

use crate::template::TemplateContext;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub containers: Vec<Container>,

    #[serde(default)]
    pub services: Vec<Service>,

    #[serde(default)]
    pub networks: Vec<Network>,

    /// Pre-computed proxy networks. When absent they are discovered from the
    /// proxy's own container.
    #[serde(default)]
    pub proxy_networks: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Container {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Names")]
    pub names: Vec<String>,
    #[serde(rename = "Image")]
    pub image: String,
    #[serde(rename = "ImageID")]
    pub image_id: String,
    #[serde(rename = "Command")]
    pub command: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Labels")]
    pub labels: HashMap<String, String>,
    #[serde(rename = "NetworkSettings")]
    pub network_settings: NetworkSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// Keyed by network name; iterated in name order.
    #[serde(rename = "Networks")]
    pub networks: BTreeMap<String, EndpointSettings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EndpointSettings {
    #[serde(rename = "NetworkID")]
    pub network_id: String,
    #[serde(rename = "IPAddress")]
    pub ip_address: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Service {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Spec")]
    pub spec: ServiceSpec,
    #[serde(rename = "Endpoint")]
    pub endpoint: Endpoint,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceSpec {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Labels")]
    pub labels: HashMap<String, String>,
    #[serde(rename = "TaskTemplate")]
    pub task_template: TaskTemplate,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TaskTemplate {
    #[serde(rename = "ContainerSpec")]
    pub container_spec: ContainerSpec,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContainerSpec {
    #[serde(rename = "Image")]
    pub image: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Endpoint {
    #[serde(rename = "VirtualIPs")]
    pub virtual_ips: Vec<VirtualIp>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VirtualIp {
    #[serde(rename = "NetworkID")]
    pub network_id: String,
    #[serde(rename = "Addr")]
    pub addr: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Network {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Ingress")]
    pub ingress: bool,
}

impl Container {
    /// Primary name without Docker's leading `/`.
    pub fn name(&self) -> &str {
        self.names
            .first()
            .map(|n| n.trim_start_matches('/'))
            .unwrap_or_default()
    }

    pub fn template_context(&self) -> TemplateContext {
        let mut ctx = TemplateContext::from_pairs([
            ("ID", self.id.as_str()),
            ("Name", self.name()),
            ("Image", self.image.as_str()),
            ("ImageID", self.image_id.as_str()),
            ("Command", self.command.as_str()),
            ("State", self.state.as_str()),
            ("Status", self.status.as_str()),
        ]);
        ctx.insert("Names", self.names.join(","));
        for (key, value) in &self.labels {
            ctx.insert(format!("Labels.{key}"), value.as_str());
        }
        ctx
    }
}

impl Service {
    pub fn template_context(&self) -> TemplateContext {
        let image = self.spec.task_template.container_spec.image.as_str();
        let mut ctx = TemplateContext::from_pairs([
            ("ID", self.id.as_str()),
            ("Name", self.spec.name.as_str()),
            ("Spec.Name", self.spec.name.as_str()),
            ("Image", image),
            ("Spec.TaskTemplate.ContainerSpec.Image", image),
        ]);
        for (key, value) in &self.spec.labels {
            ctx.insert(format!("Labels.{key}"), value.as_str());
            ctx.insert(format!("Spec.Labels.{key}"), value.as_str());
        }
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_docker_shaped_snapshot() {
        let inv: Inventory = serde_json::from_str(
            r#"{
                "containers": [{
                    "Id": "c1",
                    "Names": ["/whoami"],
                    "Labels": {"caddy.address": "whoami.example.com"},
                    "NetworkSettings": {"Networks": {"caddy": {"NetworkID": "n1", "IPAddress": "10.0.0.2"}}}
                }],
                "services": [{
                    "ID": "s1",
                    "Spec": {"Name": "api", "Labels": {"caddy.targetport": "80"}},
                    "Endpoint": {"VirtualIPs": [{"NetworkID": "n1", "Addr": "10.0.0.5/24"}]}
                }],
                "networks": [{"Id": "n1", "Name": "caddy", "Ingress": false}]
            }"#,
        )
        .unwrap();

        assert_eq!(inv.containers[0].name(), "whoami");
        assert_eq!(
            inv.containers[0].network_settings.networks["caddy"].ip_address,
            "10.0.0.2"
        );
        assert_eq!(inv.services[0].spec.name, "api");
        assert_eq!(inv.services[0].endpoint.virtual_ips[0].network_id, "n1");
        assert!(inv.proxy_networks.is_none());
    }

    #[test]
    fn container_context_exposes_attributes() {
        let container = Container {
            id: "c1".to_string(),
            names: vec!["/web".to_string(), "/alias".to_string()],
            image: "nginx".to_string(),
            labels: HashMap::from([("tier".to_string(), "front".to_string())]),
            ..Default::default()
        };
        let ctx = container.template_context();
        assert_eq!(ctx.get("Name"), Some("web"));
        assert_eq!(ctx.get("Names"), Some("/web,/alias"));
        assert_eq!(ctx.get("Image"), Some("nginx"));
        assert_eq!(ctx.get("Labels.tier"), Some("front"));
        assert_eq!(ctx.get("Spec.Name"), None);
    }

    #[test]
    fn service_context_exposes_spec_aliases() {
        let service = Service {
            id: "s1".to_string(),
            spec: ServiceSpec {
                name: "api".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let ctx = service.template_context();
        assert_eq!(ctx.expand("{{.Spec.Name}}.{{.Name}}/{{.ID}}"), "api.api/s1");
    }
}
