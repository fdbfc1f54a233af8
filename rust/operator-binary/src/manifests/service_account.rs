use stackable_operator::k8s_openapi::api::core::v1::ServiceAccount;

use crate::naming;

use super::Params;

/// Returns [`None`] if the TargetAllocator runs as an existing ServiceAccount.
pub fn build(params: &Params<'_>) -> Option<ServiceAccount> {
    if !params.spec().service_account.is_empty() {
        return None;
    }
    let name = naming::ta_service_account(params.name());
    Some(ServiceAccount {
        metadata: params.object_meta(name.clone(), params.labels(&name)),
        ..ServiceAccount::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::OperatorConfig, manifests::tests::target_allocator};

    #[test]
    fn creates_dedicated_service_account() {
        let ta = target_allocator("spec: {}");
        let config = OperatorConfig::default();
        let sa = build(&Params::new(&ta, &config).unwrap()).unwrap();
        assert_eq!(sa.metadata.name.as_deref(), Some("my-col-targetallocator"));
        assert_eq!(sa.metadata.namespace.as_deref(), Some("obs"));
    }

    #[test]
    fn skipped_for_existing_service_account() {
        let ta = target_allocator("spec:\n  serviceAccount: shared\n");
        let config = OperatorConfig::default();
        assert_eq!(build(&Params::new(&ta, &config).unwrap()), None);
    }
}
