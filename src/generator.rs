//! Whole-file generation: one compile per container and service.

use crate::config::GeneratorOptions;
use crate::directive::{self, LabelFilter, ResolveError, render_comment};
use crate::inventory::{
    Container, DiscoveryError, Inventory, InventorySource, Service, own_container_id,
    proxy_networks,
};
use anyhow::Context;
use std::collections::BTreeSet;
use std::path::PathBuf;

pub const EMPTY_FILE: &str = "# Empty file";

#[derive(Debug, Clone)]
pub struct Generator {
    filter: LabelFilter,
    proxy_service_tasks: bool,
    proxy_container_id: Option<String>,
    cgroup_path: PathBuf,
}

impl Generator {
    pub fn new(options: &GeneratorOptions) -> crate::Result<Self> {
        let filter = LabelFilter::new(&options.label_prefix)
            .with_context(|| format!("invalid label prefix {:?}", options.label_prefix))?;
        Ok(Self {
            filter,
            proxy_service_tasks: options.proxy_service_tasks,
            proxy_container_id: options.proxy_container_id.clone(),
            cgroup_path: options.cgroup_path.clone(),
        })
    }

    /// Take a snapshot from `source` and generate from it. A failed snapshot
    /// is reported inside the output rather than returned.
    pub fn run(&self, source: &impl InventorySource) -> Vec<u8> {
        match source.snapshot() {
            Ok(inventory) => self.generate(&inventory),
            Err(err) => {
                log::warn!("inventory snapshot failed: {:#}", err);
                let mut out = String::new();
                render_comment(&mut out, &format!("{:#}", err));
                out.into_bytes()
            }
        }
    }

    /// Generate the Caddyfile for every entity in `inventory`.
    ///
    /// Entity blocks are separated by a blank line. An entity whose proxy
    /// target cannot be resolved contributes a comment instead of a block.
    pub fn generate(&self, inventory: &Inventory) -> Vec<u8> {
        let mut chunks: Vec<String> = Vec::new();

        let networks = match self.caddy_networks(inventory) {
            Ok(networks) => networks,
            Err(err) => {
                log::warn!("proxy network discovery failed: {}", err);
                let mut comment = String::new();
                render_comment(&mut comment, &err.to_string());
                chunks.push(comment);
                BTreeSet::new()
            }
        };

        for container in &inventory.containers {
            chunks.push(self.container_block(container, &networks));
        }
        for service in &inventory.services {
            chunks.push(self.service_block(service, &networks));
        }

        let chunks: Vec<String> = chunks.into_iter().filter(|c| !c.is_empty()).collect();
        if chunks.is_empty() {
            return EMPTY_FILE.as_bytes().to_vec();
        }
        chunks.join("\n").into_bytes()
    }

    fn caddy_networks(&self, inventory: &Inventory) -> Result<BTreeSet<String>, DiscoveryError> {
        if let Some(networks) = &inventory.proxy_networks {
            return Ok(networks.iter().cloned().collect());
        }
        let container_id = match &self.proxy_container_id {
            Some(id) => id.clone(),
            None => own_container_id(&self.cgroup_path)?,
        };
        log::info!("Caddy ContainerID: {}", container_id);
        let networks = proxy_networks(inventory, &container_id)?;
        log::info!("Caddy Networks: {:?}", networks);
        Ok(networks)
    }

    fn container_block(&self, container: &Container, networks: &BTreeSet<String>) -> String {
        log::debug!("compiling labels of container {}", container.id);
        let compiled = directive::compile(
            &container.labels,
            &self.filter,
            &container.template_context(),
            || container_ip_address(container, networks),
        );
        entity_output(compiled)
    }

    fn service_block(&self, service: &Service, networks: &BTreeSet<String>) -> String {
        log::debug!("compiling labels of service {}", service.id);
        let compiled = directive::compile(
            &service.spec.labels,
            &self.filter,
            &service.template_context(),
            || service_proxy_target(service, networks, self.proxy_service_tasks),
        );
        entity_output(compiled)
    }
}

fn entity_output(compiled: Result<String, ResolveError>) -> String {
    match compiled {
        Ok(text) => text,
        Err(err) => {
            log::warn!("{}", err);
            let mut out = String::new();
            render_comment(&mut out, &err.to_string());
            out
        }
    }
}

/// IP address of the container on the first network it shares with the proxy.
pub fn container_ip_address(
    container: &Container,
    networks: &BTreeSet<String>,
) -> Result<String, ResolveError> {
    container
        .network_settings
        .networks
        .values()
        .find(|endpoint| networks.contains(&endpoint.network_id))
        .map(|endpoint| endpoint.ip_address.clone())
        .ok_or_else(|| ResolveError::NotInNetwork {
            kind: "Container",
            id: container.id.clone(),
        })
}

/// Service name (or `tasks.<name>`), once the service is known to have a VIP
/// on one of the proxy's networks.
pub fn service_proxy_target(
    service: &Service,
    networks: &BTreeSet<String>,
    proxy_service_tasks: bool,
) -> Result<String, ResolveError> {
    let vip = service
        .endpoint
        .virtual_ips
        .iter()
        .find(|vip| networks.contains(&vip.network_id))
        .ok_or_else(|| ResolveError::NotInNetwork {
            kind: "Service",
            id: service.id.clone(),
        })?;
    log::debug!("service {} reachable via VIP {}", service.spec.name, vip.addr);

    if proxy_service_tasks {
        return Ok(format!("tasks.{}", service.spec.name));
    }
    Ok(service.spec.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::model::{
        EndpointSettings, Network, NetworkSettings, ServiceSpec, VirtualIp,
    };
    use pretty_assertions::assert_eq;
    use std::collections::{BTreeMap, HashMap};

    fn labels(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn container(id: &str, network: &str, ip: &str, pairs: &[(&str, &str)]) -> Container {
        Container {
            id: id.to_string(),
            names: vec![format!("/{id}")],
            labels: labels(pairs),
            network_settings: NetworkSettings {
                networks: BTreeMap::from([(
                    network.to_string(),
                    EndpointSettings {
                        network_id: network.to_string(),
                        ip_address: ip.to_string(),
                    },
                )]),
            },
            ..Default::default()
        }
    }

    fn service(id: &str, name: &str, network: &str, pairs: &[(&str, &str)]) -> Service {
        Service {
            id: id.to_string(),
            spec: ServiceSpec {
                name: name.to_string(),
                labels: labels(pairs),
                ..Default::default()
            },
            endpoint: crate::inventory::model::Endpoint {
                virtual_ips: vec![VirtualIp {
                    network_id: network.to_string(),
                    addr: "10.0.9.2/24".to_string(),
                }],
            },
        }
    }

    fn generator(tasks: bool) -> Generator {
        Generator::new(&GeneratorOptions {
            proxy_service_tasks: tasks,
            ..Default::default()
        })
        .unwrap()
    }

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    fn inventory() -> Inventory {
        Inventory {
            proxy_networks: Some(vec!["caddy".to_string()]),
            ..Default::default()
        }
    }

    #[test]
    fn empty_inventory_gets_placeholder() {
        assert_eq!(text(generator(false).generate(&inventory())), EMPTY_FILE);
    }

    #[test]
    fn unlabelled_entities_get_placeholder() {
        let mut inv = inventory();
        inv.containers
            .push(container("c1", "caddy", "10.0.0.2", &[("other.key", "v")]));
        assert_eq!(text(generator(false).generate(&inv)), EMPTY_FILE);
    }

    #[test]
    fn containers_then_services_separated_by_blank_line() {
        let mut inv = inventory();
        inv.containers.push(container(
            "c1",
            "caddy",
            "10.0.0.2",
            &[("caddy.address", "whoami.example.com"), ("caddy.targetport", "8000")],
        ));
        inv.services.push(service(
            "s1",
            "api",
            "caddy",
            &[
                ("caddy.address", "api.example.com"),
                ("caddy.targetport", "80"),
                ("caddy.targetpath", "/v1"),
            ],
        ));

        assert_eq!(
            text(generator(false).generate(&inv)),
            "whoami.example.com {\n  proxy / 10.0.0.2:8000\n}\n\
             \n\
             api.example.com {\n  proxy / api:80/v1\n}\n"
        );
    }

    #[test]
    fn service_tasks_target() {
        let mut inv = inventory();
        inv.services.push(service(
            "s1",
            "api",
            "caddy",
            &[("caddy.address", "{{.Name}}.example.com"), ("caddy.targetport", "80")],
        ));
        assert_eq!(
            text(generator(true).generate(&inv)),
            "api.example.com {\n  proxy / tasks.api:80\n}\n"
        );
    }

    #[test]
    fn unreachable_entity_becomes_comment_without_affecting_others() {
        let mut inv = inventory();
        inv.containers
            .push(container("c1", "other", "172.17.0.2", &[("caddy.targetport", "80")]));
        inv.containers.push(container(
            "c2",
            "caddy",
            "10.0.0.3",
            &[("caddy.address", "ok.example.com"), ("caddy.targetport", "80")],
        ));

        assert_eq!(
            text(generator(false).generate(&inv)),
            "# Container c1 and caddy are not in same network\n\
             \n\
             ok.example.com {\n  proxy / 10.0.0.3:80\n}\n"
        );
    }

    #[test]
    fn service_without_shared_network_is_rejected() {
        let svc = service("s9", "api", "elsewhere", &[]);
        let networks = BTreeSet::from(["caddy".to_string()]);
        assert_eq!(
            service_proxy_target(&svc, &networks, false).unwrap_err(),
            ResolveError::NotInNetwork {
                kind: "Service",
                id: "s9".to_string()
            }
        );
    }

    #[test]
    fn networks_discovered_from_proxy_container() {
        let mut proxy = container("proxy1", "caddy", "10.0.0.1", &[]);
        proxy.network_settings.networks.insert(
            "ingress".to_string(),
            EndpointSettings {
                network_id: "ingress".to_string(),
                ip_address: "10.255.0.2".to_string(),
            },
        );
        let inv = Inventory {
            containers: vec![
                proxy,
                container("c1", "ingress", "10.255.0.3", &[("caddy.targetport", "80")]),
            ],
            networks: vec![Network {
                id: "ingress".to_string(),
                name: "ingress".to_string(),
                ingress: true,
            }],
            ..Default::default()
        };
        let generator = Generator::new(&GeneratorOptions {
            proxy_container_id: Some("proxy1".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            text(generator.generate(&inv)),
            "# Container c1 and caddy are not in same network\n"
        );
    }

    #[test]
    fn discovery_failure_is_commented_and_entities_still_processed() {
        let dir = tempfile::tempdir().unwrap();
        let cgroup = dir.path().join("cgroup");
        std::fs::write(&cgroup, "0::/\n").unwrap();
        let generator = Generator::new(&GeneratorOptions {
            cgroup_path: cgroup,
            ..Default::default()
        })
        .unwrap();

        let inv = Inventory {
            containers: vec![container(
                "c1",
                "caddy",
                "10.0.0.2",
                &[("caddy.address", "static.example.com"), ("caddy.root", "/srv")],
            )],
            ..Default::default()
        };
        assert_eq!(
            text(generator.generate(&inv)),
            "# Cannot find container id\n\nstatic.example.com {\n  root /srv\n}\n"
        );
    }

    #[test]
    fn custom_prefix() {
        let generator = Generator::new(&GeneratorOptions {
            label_prefix: "web".to_string(),
            ..Default::default()
        })
        .unwrap();
        let mut inv = inventory();
        inv.containers.push(container(
            "c1",
            "caddy",
            "10.0.0.2",
            &[("web.address", "a.com"), ("caddy.address", "ignored.com")],
        ));
        assert_eq!(text(generator.generate(&inv)), "a.com {\n}\n");
    }

    struct FailingSource;

    impl InventorySource for FailingSource {
        fn snapshot(&self) -> crate::Result<Inventory> {
            Err(anyhow::anyhow!(r"daemon unreachable\nretry later"))
        }
    }

    #[test]
    fn failed_snapshot_is_reported_as_comment() {
        assert_eq!(
            text(generator(false).run(&FailingSource)),
            "# daemon unreachable\n# retry later\n"
        );
    }
}
