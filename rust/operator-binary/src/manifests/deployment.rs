use openssl::sha::Sha256;
use snafu::{ensure, ResultExt, Snafu};
use stackable_operator::{
    builder::pod::volume::VolumeBuilder,
    k8s_openapi::{
        api::{
            apps::v1::{Deployment, DeploymentSpec},
            core::v1::{Container, ContainerPort, PodSpec, PodTemplateSpec, VolumeMount},
        },
        apimachinery::pkg::apis::meta::v1::LabelSelector,
    },
    kube::api::ObjectMeta,
};

use crate::{naming, utils::FmtByteSlice};

use super::{
    config_map::{self, CONFIG_FILE_NAME, TLS_DIR},
    Params,
};

pub const CONTAINER_NAME: &str = "ta-container";
pub const HTTP_PORT: i32 = 8080;
pub const HTTPS_PORT: i32 = 8443;

/// Rolls the pods whenever the rendered config changes.
pub const CONFIG_HASH_ANNOTATION: &str = "opentelemetry-targetallocator-config/hash";

const CONFIG_VOLUME_NAME: &str = "ta-internal";
const CONFIG_DIR: &str = "/conf";
const TLS_VOLUME_NAME: &str = "ta-secret";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("invalid target allocator image {image:?}"))]
    InvalidImage { image: String },

    #[snafu(display("failed to render the config file for the config hash"))]
    RenderConfig { source: config_map::Error },
}
type Result<T, E = Error> = std::result::Result<T, E>;

/// The pod template carries a hash of the rendered config file. The file is rendered again
/// for that, so a broken config fails both this step and the ConfigMap step.
pub fn build(params: &Params<'_>) -> Result<Deployment> {
    let name = naming::ta_deployment(params.name());
    let spec = params.spec();
    let image = resolve_image(params)?;
    let config_file = config_map::config_file(params).context(RenderConfigSnafu)?;
    let mtls = params.mtls_enabled();

    let mut ports = vec![container_port("http", HTTP_PORT)];
    let mut volume_mounts = vec![VolumeMount {
        name: CONFIG_VOLUME_NAME.to_string(),
        mount_path: CONFIG_DIR.to_string(),
        ..VolumeMount::default()
    }];
    let mut volumes = vec![VolumeBuilder::new(CONFIG_VOLUME_NAME)
        .with_config_map(naming::ta_config_map(params.name()))
        .build()];
    if mtls {
        ports.push(container_port("https", HTTPS_PORT));
        volume_mounts.push(VolumeMount {
            name: TLS_VOLUME_NAME.to_string(),
            mount_path: TLS_DIR.to_string(),
            read_only: Some(true),
            ..VolumeMount::default()
        });
        volumes.push(
            VolumeBuilder::new(TLS_VOLUME_NAME)
                .with_secret(naming::ta_server_certificate(params.name()), false)
                .build(),
        );
    }

    let service_account = if spec.service_account.is_empty() {
        naming::ta_service_account(params.name())
    } else {
        spec.service_account.clone()
    };

    let labels = params.labels(&name);
    Ok(Deployment {
        metadata: params.object_meta(name, labels.clone()),
        spec: Some(DeploymentSpec {
            replicas: spec.replicas,
            selector: LabelSelector {
                match_labels: Some(params.selector_labels()),
                ..LabelSelector::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    annotations: Some(
                        [(
                            CONFIG_HASH_ANNOTATION.to_string(),
                            config_hash([(CONFIG_FILE_NAME, config_file.as_str())]),
                        )]
                        .into(),
                    ),
                    ..ObjectMeta::default()
                }),
                spec: Some(PodSpec {
                    service_account_name: Some(service_account),
                    containers: vec![Container {
                        name: CONTAINER_NAME.to_string(),
                        image: Some(image),
                        args: Some(vec![format!("--config-file={CONFIG_DIR}/{CONFIG_FILE_NAME}")]),
                        ports: Some(ports),
                        volume_mounts: Some(volume_mounts),
                        resources: spec.resources.clone(),
                        ..Container::default()
                    }],
                    volumes: Some(volumes),
                    node_selector: (!spec.node_selector.is_empty())
                        .then(|| spec.node_selector.clone()),
                    tolerations: (!spec.tolerations.is_empty()).then(|| spec.tolerations.clone()),
                    ..PodSpec::default()
                }),
            },
            ..DeploymentSpec::default()
        }),
        ..Deployment::default()
    })
}

fn resolve_image(params: &Params<'_>) -> Result<String> {
    let image = match params.spec().image.as_str() {
        "" => params.config().target_allocator_image.as_str(),
        image => image,
    };
    ensure!(
        !image.is_empty() && !image.contains(char::is_whitespace),
        InvalidImageSnafu { image }
    );
    Ok(image.to_string())
}

fn container_port(name: &str, port: i32) -> ContainerPort {
    ContainerPort {
        name: Some(name.to_string()),
        container_port: port,
        protocol: Some("TCP".to_string()),
        ..ContainerPort::default()
    }
}

/// SHA-256 over ConfigMap entries, in the order given.
fn config_hash<'a>(data: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut hasher = Sha256::new();
    for (key, value) in data {
        hasher.update(key.as_bytes());
        hasher.update(&[0]);
        hasher.update(value.as_bytes());
        hasher.update(&[0]);
    }
    format!("{:x}", FmtByteSlice(&hasher.finish()))
}
