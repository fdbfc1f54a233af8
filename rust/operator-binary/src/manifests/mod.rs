//! Assembles all Kubernetes objects that make up a TargetAllocator.
//!
//! [`build`] is a pure function of its [`Params`]: applying, diffing and retrying the
//! resulting objects is up to the caller.

use serde::Serialize;
use snafu::{ResultExt, Snafu};
use stackable_operator::{
    k8s_openapi::api::{
        apps::v1::Deployment,
        core::v1::{ConfigMap, Service, ServiceAccount},
        policy::v1::PodDisruptionBudget,
    },
    kube::{
        api::{DynamicObject, ObjectMeta},
        runtime::reflector::ObjectRef,
        Resource,
    },
};

use crate::external_crd::{
    cert_manager::{Certificate, Issuer},
    prometheus_operator::ServiceMonitor,
};

pub use self::params::{Params, ParamsError, COMPONENT};

pub mod certificate;
pub mod config_map;
pub mod deployment;
pub mod issuer;
mod params;
pub mod pod_disruption_budget;
pub mod service;
pub mod service_account;
pub mod service_monitor;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to build {step} for the TargetAllocator"))]
    BuildManifest {
        source: StepError,
        step: &'static str,
    },
}

impl Error {
    /// Name of the step that failed.
    pub fn step(&self) -> &'static str {
        match self {
            Error::BuildManifest { step, .. } => step,
        }
    }
}

/// Failures of the individual fallible steps.
#[derive(Debug, Snafu)]
pub enum StepError {
    #[snafu(display("invalid TargetAllocator configuration"), context(false))]
    ConfigMap { source: config_map::Error },

    #[snafu(display("invalid Deployment settings"), context(false))]
    Deployment { source: deployment::Error },

    #[snafu(display("invalid PodDisruptionBudget settings"), context(false))]
    PodDisruptionBudget {
        source: pod_disruption_budget::Error,
    },
}

/// Any object generated for a TargetAllocator.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Manifest {
    ConfigMap(ConfigMap),
    Deployment(Deployment),
    ServiceAccount(ServiceAccount),
    Service(Service),
    PodDisruptionBudget(PodDisruptionBudget),
    ServiceMonitor(ServiceMonitor),
    Issuer(Issuer),
    Certificate(Certificate),
}

impl Manifest {
    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Manifest::ConfigMap(obj) => obj.meta(),
            Manifest::Deployment(obj) => obj.meta(),
            Manifest::ServiceAccount(obj) => obj.meta(),
            Manifest::Service(obj) => obj.meta(),
            Manifest::PodDisruptionBudget(obj) => obj.meta(),
            Manifest::ServiceMonitor(obj) => obj.meta(),
            Manifest::Issuer(obj) => obj.meta(),
            Manifest::Certificate(obj) => obj.meta(),
        }
    }

    pub fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }

    /// Reference to the object, for logging/errors.
    pub fn object_ref(&self) -> ObjectRef<DynamicObject> {
        match self {
            Manifest::ConfigMap(obj) => ObjectRef::from_obj(obj).erase(),
            Manifest::Deployment(obj) => ObjectRef::from_obj(obj).erase(),
            Manifest::ServiceAccount(obj) => ObjectRef::from_obj(obj).erase(),
            Manifest::Service(obj) => ObjectRef::from_obj(obj).erase(),
            Manifest::PodDisruptionBudget(obj) => ObjectRef::from_obj(obj).erase(),
            Manifest::ServiceMonitor(obj) => ObjectRef::from_obj(obj).erase(),
            Manifest::Issuer(obj) => ObjectRef::from_obj(obj).erase(),
            Manifest::Certificate(obj) => ObjectRef::from_obj(obj).erase(),
        }
    }
}

macro_rules! impl_from_for_manifest {
    ($($kind:ident),* $(,)?) => {
        $(
            impl From<$kind> for Manifest {
                fn from(obj: $kind) -> Self {
                    Manifest::$kind(obj)
                }
            }
        )*
    };
}

impl_from_for_manifest!(
    ConfigMap,
    Deployment,
    ServiceAccount,
    Service,
    PodDisruptionBudget,
    ServiceMonitor,
    Issuer,
    Certificate,
);

type FallibleBuild = fn(&Params<'_>) -> Result<Option<Manifest>, StepError>;
type InfallibleBuild = fn(&Params<'_>) -> Option<Manifest>;

/// One unit of manifest production.
///
/// Both kinds may produce no object at all, which is not an error.
#[derive(Clone, Copy)]
pub enum ManifestStep {
    Fallible {
        name: &'static str,
        build: FallibleBuild,
    },
    Infallible {
        name: &'static str,
        build: InfallibleBuild,
    },
}

impl ManifestStep {
    pub fn name(&self) -> &'static str {
        match self {
            ManifestStep::Fallible { name, .. } | ManifestStep::Infallible { name, .. } => name,
        }
    }

    fn run(&self, params: &Params<'_>) -> Result<Option<Manifest>, Error> {
        let manifest = match self {
            ManifestStep::Fallible { name, build } => {
                build(params).context(BuildManifestSnafu { step: *name })?
            }
            ManifestStep::Infallible { build, .. } => build(params),
        };
        match &manifest {
            Some(manifest) => tracing::debug!(
                step = self.name(),
                object = %manifest.object_ref(),
                "built manifest"
            ),
            None => tracing::debug!(step = self.name(), "step produced no manifest, skipping"),
        }
        Ok(manifest)
    }
}

/// The steps to run for `params`, in execution order.
pub fn steps(params: &Params<'_>) -> Vec<ManifestStep> {
    let mut steps = vec![
        ManifestStep::Fallible {
            name: "ConfigMap",
            build: |params| Ok(Some(config_map::build(params)?.into())),
        },
        ManifestStep::Fallible {
            name: "Deployment",
            build: |params| Ok(Some(deployment::build(params)?.into())),
        },
        ManifestStep::Infallible {
            name: "ServiceAccount",
            build: |params| service_account::build(params).map(Manifest::from),
        },
        ManifestStep::Infallible {
            name: "Service",
            build: |params| service::build(params).map(Manifest::from),
        },
        ManifestStep::Fallible {
            name: "PodDisruptionBudget",
            build: |params| Ok(pod_disruption_budget::build(params)?.map(Manifest::from)),
        },
    ];

    if params.service_monitor_enabled() {
        steps.push(ManifestStep::Infallible {
            name: "ServiceMonitor",
            build: |params| service_monitor::build(params).map(Manifest::from),
        });
    }

    // Certificates refer to the issuers by name, so the order matters
    if params.mtls_enabled() {
        steps.extend([
            ManifestStep::Infallible {
                name: "SelfSignedIssuer",
                build: |params| Some(issuer::self_signed_issuer(params).into()),
            },
            ManifestStep::Infallible {
                name: "CACertificate",
                build: |params| Some(certificate::ca_certificate(params).into()),
            },
            ManifestStep::Infallible {
                name: "CAIssuer",
                build: |params| Some(issuer::ca_issuer(params).into()),
            },
            ManifestStep::Infallible {
                name: "ServingCertificate",
                build: |params| Some(certificate::serving_certificate(params).into()),
            },
            ManifestStep::Infallible {
                name: "ClientCertificate",
                build: |params| Some(certificate::client_certificate(params).into()),
            },
        ]);
    }

    steps
}

/// Builds all objects for the TargetAllocator, in step order.
///
/// Stops at the first failing step, in which case no objects are returned at all.
pub fn build(params: &Params<'_>) -> Result<Vec<Manifest>, Error> {
    if !params.enabled() {
        tracing::debug!(
            target_allocator = params.name(),
            "target allocator is disabled, not building any manifests"
        );
        return Ok(Vec::new());
    }
    steps(params)
        .iter()
        .filter_map(|step| step.run(params).transpose())
        .collect()
}
