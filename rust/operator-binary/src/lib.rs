pub mod config;
pub mod crd;
pub mod external_crd;
pub mod labels;
pub mod manifests;
pub mod naming;
pub mod utils;
