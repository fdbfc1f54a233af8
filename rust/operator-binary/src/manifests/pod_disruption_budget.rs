use snafu::{ensure, Snafu};
use stackable_operator::k8s_openapi::{
    api::policy::v1::{PodDisruptionBudget, PodDisruptionBudgetSpec},
    apimachinery::pkg::{apis::meta::v1::LabelSelector, util::intstr::IntOrString},
};

use crate::naming;

use super::Params;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("podDisruptionBudget may set either minAvailable or maxUnavailable, not both"))]
    ConflictingDisruptionBudget,
}

/// Returns [`None`] if the allocation strategy doesn't keep targets sticky,
/// since then any replica can take over immediately.
pub fn build(params: &Params<'_>) -> Result<Option<PodDisruptionBudget>, Error> {
    let spec = params.spec();
    if !spec.allocation_strategy.is_sticky() {
        tracing::debug!(
            allocation_strategy = %spec.allocation_strategy,
            "allocation strategy does not benefit from a PodDisruptionBudget, skipping"
        );
        return Ok(None);
    }

    let (min_available, max_unavailable) = match &spec.pod_disruption_budget {
        Some(pdb) => {
            ensure!(
                pdb.min_available.is_none() || pdb.max_unavailable.is_none(),
                ConflictingDisruptionBudgetSnafu
            );
            (pdb.min_available.clone(), pdb.max_unavailable.clone())
        }
        None => (None, None),
    };
    let max_unavailable = match (&min_available, max_unavailable) {
        (None, None) => Some(IntOrString::Int(1)),
        (_, max_unavailable) => max_unavailable,
    };

    let name = naming::ta_pod_disruption_budget(params.name());
    Ok(Some(PodDisruptionBudget {
        metadata: params.object_meta(name.clone(), params.labels(&name)),
        spec: Some(PodDisruptionBudgetSpec {
            min_available,
            max_unavailable,
            selector: Some(LabelSelector {
                match_labels: Some(params.selector_labels()),
                ..LabelSelector::default()
            }),
            ..PodDisruptionBudgetSpec::default()
        }),
        ..PodDisruptionBudget::default()
    }))
}
