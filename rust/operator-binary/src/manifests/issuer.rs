use stackable_operator::kube::api::ObjectMeta;

use crate::{
    external_crd::cert_manager::{CaIssuer, Issuer, IssuerSpec, SelfSignedIssuer},
    labels, naming,
};

use super::{Params, COMPONENT};

/// Bootstraps the chain by signing the CA certificate with its own key.
pub fn self_signed_issuer(params: &Params<'_>) -> Issuer {
    let name = naming::self_signed_issuer(params.name());
    Issuer {
        metadata: issuer_meta(params, name),
        spec: IssuerSpec {
            self_signed: Some(SelfSignedIssuer {}),
            ca: None,
        },
    }
}

/// Signs the server and client certificates with the CA certificate's key pair.
pub fn ca_issuer(params: &Params<'_>) -> Issuer {
    let name = naming::ca_issuer(params.name());
    Issuer {
        metadata: issuer_meta(params, name),
        spec: IssuerSpec {
            self_signed: None,
            ca: Some(CaIssuer {
                secret_name: naming::ca_certificate(params.name()),
            }),
        },
    }
}

fn issuer_meta(params: &Params<'_>, name: String) -> ObjectMeta {
    let labels = labels::labels(params.meta(), &name, &params.spec().image, COMPONENT, &[]);
    params.object_meta(name, labels)
}
