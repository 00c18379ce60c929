//! The two built-in deployment templates.
//!
//! The Kubernetes template renders to an `apps/v1` Deployment; the Compose
//! template renders to a compose-file tree the adapter serializes to YAML.
//! Both reference isolation, storage, and configuration primitives created
//! by the adapter during infrastructure provisioning, and both wire the
//! application's health endpoint into the platform's own probe mechanism.

use serde_json::json;
use tenantforge_core::InfrastructureKind;

use crate::manager::{DeploymentTemplate, TemplateManager};

fn required(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

/// Built-in Kubernetes deployment template.
#[must_use]
pub fn kubernetes_template() -> DeploymentTemplate {
    DeploymentTemplate {
        name: TemplateManager::DEFAULT_TEMPLATE.to_string(),
        kind: InfrastructureKind::Kubernetes,
        required_variables: required(&[
            "tenant_id",
            "namespace",
            "workload_name",
            "app_image",
            "plan",
            "cpu_limit",
            "memory_limit",
            "volume_name",
            "config_name",
            "secret_name",
        ]),
        spec: json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {
                "name": "{{workload_name}}",
                "namespace": "{{namespace}}",
                "labels": {
                    "app": "tenant-stack",
                    "tenantforge.io/tenant": "{{tenant_id}}",
                    "tenantforge.io/plan": "{{plan}}"
                }
            },
            "spec": {
                "replicas": 1,
                "selector": {
                    "matchLabels": {
                        "tenantforge.io/tenant": "{{tenant_id}}"
                    }
                },
                "template": {
                    "metadata": {
                        "labels": {
                            "app": "tenant-stack",
                            "tenantforge.io/tenant": "{{tenant_id}}"
                        }
                    },
                    "spec": {
                        "containers": [{
                            "name": "app",
                            "image": "{{app_image}}",
                            "ports": [{"containerPort": 8080, "name": "http"}],
                            "envFrom": [
                                {"configMapRef": {"name": "{{config_name}}"}},
                                {"secretRef": {"name": "{{secret_name}}"}}
                            ],
                            "resources": {
                                "requests": {
                                    "cpu": "{{cpu_limit}}",
                                    "memory": "{{memory_limit}}"
                                },
                                "limits": {
                                    "cpu": "{{cpu_limit}}",
                                    "memory": "{{memory_limit}}"
                                }
                            },
                            "volumeMounts": [{
                                "name": "data",
                                "mountPath": "/var/lib/tenant/data"
                            }],
                            "readinessProbe": {
                                "httpGet": {"path": "/health/live", "port": 8080},
                                "initialDelaySeconds": 5,
                                "periodSeconds": 10,
                                "timeoutSeconds": 5,
                                "failureThreshold": 3
                            },
                            "livenessProbe": {
                                "httpGet": {"path": "/health/live", "port": 8080},
                                "initialDelaySeconds": 30,
                                "periodSeconds": 30,
                                "timeoutSeconds": 10,
                                "failureThreshold": 3
                            }
                        }],
                        "volumes": [{
                            "name": "data",
                            "persistentVolumeClaim": {"claimName": "{{volume_name}}"}
                        }],
                        "securityContext": {
                            "runAsNonRoot": true,
                            "runAsUser": 1000,
                            "fsGroup": 1000
                        }
                    }
                }
            }
        }),
    }
}

/// Built-in Docker Compose template.
///
/// The network and volume are created by the adapter before deployment, so
/// the compose file references them as external resources through fixed
/// aliases.
#[must_use]
pub fn compose_template() -> DeploymentTemplate {
    DeploymentTemplate {
        name: TemplateManager::DEFAULT_TEMPLATE.to_string(),
        kind: InfrastructureKind::DockerCompose,
        required_variables: required(&[
            "tenant_id",
            "workload_name",
            "app_image",
            "cpu_limit",
            "memory_limit",
            "http_port",
            "network_name",
            "volume_name",
        ]),
        spec: json!({
            "name": "tenant-{{tenant_id}}",
            "services": {
                "app": {
                    "image": "{{app_image}}",
                    "container_name": "{{workload_name}}",
                    "restart": "unless-stopped",
                    "env_file": [".env"],
                    "ports": ["{{http_port}}:8080"],
                    "networks": ["tenant"],
                    "volumes": ["data:/var/lib/tenant/data"],
                    "deploy": {
                        "resources": {
                            "limits": {
                                "cpus": "{{cpu_limit}}",
                                "memory": "{{memory_limit}}"
                            }
                        }
                    },
                    "healthcheck": {
                        "test": ["CMD", "curl", "-f", "http://localhost:8080/health/live"],
                        "interval": "10s",
                        "timeout": "5s",
                        "retries": 5,
                        "start_period": "15s"
                    },
                    "labels": {
                        "tenantforge.io/tenant": "{{tenant_id}}"
                    }
                }
            },
            "networks": {
                "tenant": {"name": "{{network_name}}", "external": true}
            },
            "volumes": {
                "data": {"name": "{{volume_name}}", "external": true}
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kubernetes_template_declares_its_variables() {
        let template = kubernetes_template();
        assert_eq!(template.kind, InfrastructureKind::Kubernetes);
        assert!(template
            .required_variables
            .contains(&"namespace".to_string()));
        assert_eq!(template.spec["kind"], "Deployment");
    }

    #[test]
    fn compose_template_references_external_primitives() {
        let template = compose_template();
        assert_eq!(template.kind, InfrastructureKind::DockerCompose);
        assert_eq!(template.spec["networks"]["tenant"]["external"], true);
        assert_eq!(template.spec["volumes"]["data"]["external"], true);
    }
}
