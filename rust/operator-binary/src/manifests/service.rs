use stackable_operator::k8s_openapi::{
    api::core::v1::{Service, ServicePort, ServiceSpec},
    apimachinery::pkg::util::intstr::IntOrString,
};

use crate::naming;

use super::Params;

/// Name of the Service port that serves the allocation API (and metrics).
pub const PORT_NAME: &str = "targetallocation";
pub const HTTPS_PORT_NAME: &str = "targetallocation-https";

pub fn build(params: &Params<'_>) -> Option<Service> {
    let name = naming::ta_service(params.name());
    let mut ports = vec![service_port(PORT_NAME, 80, "http")];
    if params.mtls_enabled() {
        ports.push(service_port(HTTPS_PORT_NAME, 443, "https"));
    }
    Some(Service {
        metadata: params.object_meta(name.clone(), params.labels(&name)),
        spec: Some(ServiceSpec {
            selector: Some(params.selector_labels()),
            ports: Some(ports),
            ..ServiceSpec::default()
        }),
        ..Service::default()
    })
}

fn service_port(name: &str, port: i32, target_port: &str) -> ServicePort {
    ServicePort {
        name: Some(name.to_string()),
        port,
        target_port: Some(IntOrString::String(target_port.to_string())),
        protocol: Some("TCP".to_string()),
        ..ServicePort::default()
    }
}
