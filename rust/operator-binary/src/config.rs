//! Operator-wide settings that decide which optional manifests get built.

pub const DEFAULT_TARGET_ALLOCATOR_IMAGE: &str =
    "ghcr.io/open-telemetry/opentelemetry-operator/target-allocator:0.100.0";

/// Whether the cert-manager CRDs were found in the cluster.
///
/// Detection happens outside of this crate, the result is passed in as-is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum CertManagerAvailability {
    Available,
    #[default]
    NotAvailable,
}

#[derive(clap::Args, Clone, Debug, Default, PartialEq, Eq)]
pub struct FeatureGates {
    /// Generate prometheus-operator objects (such as `ServiceMonitor`s)
    #[arg(long, env)]
    pub prometheus_operator_is_available: bool,
}

#[derive(clap::Args, Clone, Debug, PartialEq, Eq)]
pub struct OperatorConfig {
    /// Whether cert-manager is installed in the cluster
    #[arg(long, env, default_value_t, value_enum)]
    pub cert_manager_availability: CertManagerAvailability,

    /// Secure the target allocator with mutual TLS, requires cert-manager
    #[arg(long, env)]
    pub enable_target_allocator_mtls: bool,

    /// Image used for target allocators that don't specify one
    #[arg(long, env, default_value = DEFAULT_TARGET_ALLOCATOR_IMAGE)]
    pub target_allocator_image: String,

    /// Instance labels that are not copied onto generated objects.
    /// A trailing `*` matches any label with that prefix.
    #[arg(long, env, value_delimiter = ',')]
    pub labels_filter: Vec<String>,

    #[command(flatten)]
    pub feature_gates: FeatureGates,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            cert_manager_availability: CertManagerAvailability::default(),
            enable_target_allocator_mtls: false,
            target_allocator_image: DEFAULT_TARGET_ALLOCATOR_IMAGE.to_string(),
            labels_filter: Vec::new(),
            feature_gates: FeatureGates::default(),
        }
    }
}

impl OperatorConfig {
    pub fn cert_manager_availability(&self) -> CertManagerAvailability {
        self.cert_manager_availability
    }

    pub fn enable_target_allocator_mtls(&self) -> bool {
        self.enable_target_allocator_mtls
    }
}
