//! The cert-manager certificates that make up the target allocator's mTLS chain.
//!
//! The self-signed CA certificate is issued by the self-signed [`Issuer`](super::issuer),
//! the server and client certificates are issued by the CA issuer, which signs with the
//! CA certificate's key pair.

use std::collections::BTreeMap;

use crate::{
    external_crd::cert_manager::{
        Certificate, CertificatePrivateKey, CertificateSpec, ObjectReference, X509Subject,
    },
    labels, naming,
};

use super::{Params, COMPONENT};

/// Organizational unit of all certificates issued for target allocators.
pub const ORGANIZATIONAL_UNIT: &str = "opentelemetry-operator";
pub const ISSUER_KIND: &str = "Issuer";

const CA_KEY_ALGORITHM: &str = "ECDSA";
const CA_KEY_SIZE: u32 = 256;

pub fn ca_certificate(params: &Params<'_>) -> Certificate {
    let name = naming::ca_certificate(params.name());
    Certificate {
        metadata: params.object_meta(name.clone(), certificate_labels(params, &name)),
        spec: CertificateSpec {
            is_ca: true,
            common_name: Some(name.clone()),
            dns_names: Vec::new(),
            subject: Some(subject()),
            secret_name: name,
            private_key: Some(CertificatePrivateKey {
                algorithm: CA_KEY_ALGORITHM.to_string(),
                size: CA_KEY_SIZE,
            }),
            issuer_ref: issuer_ref(naming::self_signed_issuer(params.name())),
        },
    }
}

pub fn serving_certificate(params: &Params<'_>) -> Certificate {
    leaf_certificate(params, naming::ta_server_certificate(params.name()))
}

/// The client certificate is issued for the same DNS names as the serving certificate,
/// peers only check that it was signed by the shared CA.
pub fn client_certificate(params: &Params<'_>) -> Certificate {
    leaf_certificate(params, naming::ta_client_certificate(params.name()))
}

/// DNS names under which the target allocator's Service is reachable in-cluster.
pub fn dns_names(params: &Params<'_>) -> Vec<String> {
    let service = naming::ta_service(params.name());
    let namespace = params.namespace();
    vec![
        format!("{service}.{namespace}.svc"),
        format!("{service}.{namespace}.svc.cluster.local"),
    ]
}

fn leaf_certificate(params: &Params<'_>, name: String) -> Certificate {
    Certificate {
        metadata: params.object_meta(name.clone(), certificate_labels(params, &name)),
        spec: CertificateSpec {
            is_ca: false,
            common_name: None,
            dns_names: dns_names(params),
            subject: Some(subject()),
            secret_name: name,
            private_key: None,
            issuer_ref: issuer_ref(naming::ca_issuer(params.name())),
        },
    }
}

// The label filter is not applied to certificates
fn certificate_labels(params: &Params<'_>, name: &str) -> BTreeMap<String, String> {
    labels::labels(params.meta(), name, &params.spec().image, COMPONENT, &[])
}

fn subject() -> X509Subject {
    X509Subject {
        organizational_units: vec![ORGANIZATIONAL_UNIT.to_string()],
    }
}

fn issuer_ref(name: String) -> ObjectReference {
    ObjectReference {
        name,
        kind: Some(ISSUER_KIND.to_string()),
    }
}
