//! Names of the objects generated for a TargetAllocator instance.
//!
//! Every name is the instance name plus a fixed suffix, shortened to fit into a DNS label.
//! Distinct instance names always map to distinct object names.

use openssl::sha::sha256;

use crate::utils::FmtByteSlice;

pub const DNS_LABEL_MAX_LENGTH: usize = 63;
const INSTANCE_HASH_LENGTH: usize = 8;

const SUFFIX_TARGET_ALLOCATOR: &str = "-targetallocator";

pub fn ta_config_map(instance: &str) -> String {
    suffixed(instance, SUFFIX_TARGET_ALLOCATOR)
}

pub fn ta_deployment(instance: &str) -> String {
    suffixed(instance, SUFFIX_TARGET_ALLOCATOR)
}

pub fn ta_service(instance: &str) -> String {
    suffixed(instance, SUFFIX_TARGET_ALLOCATOR)
}

pub fn ta_service_account(instance: &str) -> String {
    suffixed(instance, SUFFIX_TARGET_ALLOCATOR)
}

pub fn ta_pod_disruption_budget(instance: &str) -> String {
    suffixed(instance, SUFFIX_TARGET_ALLOCATOR)
}

pub fn ta_service_monitor(instance: &str) -> String {
    suffixed(instance, SUFFIX_TARGET_ALLOCATOR)
}

pub fn ca_certificate(instance: &str) -> String {
    suffixed(instance, "-ca-cert")
}

pub fn ca_issuer(instance: &str) -> String {
    suffixed(instance, "-ca-issuer")
}

pub fn self_signed_issuer(instance: &str) -> String {
    suffixed(instance, "-self-signed-issuer")
}

pub fn ta_server_certificate(instance: &str) -> String {
    suffixed(instance, "-ta-server-cert")
}

pub fn ta_client_certificate(instance: &str) -> String {
    suffixed(instance, "-ta-client-cert")
}

/// Appends `suffix` to `instance`.
///
/// If the result would exceed [`DNS_LABEL_MAX_LENGTH`], the instance name is cut short and
/// followed by a hash of the full instance name, so that instances sharing a long prefix
/// still get distinct names.
fn suffixed(instance: &str, suffix: &str) -> String {
    if instance.len() + suffix.len() <= DNS_LABEL_MAX_LENGTH {
        return dns_name(&format!("{instance}{suffix}"));
    }
    let hash = instance_hash(instance);
    let budget = DNS_LABEL_MAX_LENGTH.saturating_sub(suffix.len() + hash.len() + 1);
    dns_name(&format!("{}-{hash}{suffix}", truncate(instance, budget)))
}

/// First [`INSTANCE_HASH_LENGTH`] hex digits of the SHA-256 of `instance`.
fn instance_hash(instance: &str) -> String {
    let digest = sha256(instance.as_bytes());
    format!("{:x}", FmtByteSlice(&digest[..INSTANCE_HASH_LENGTH / 2]))
}

/// Cuts `value` to at most `max_len` bytes, without splitting a character.
pub(crate) fn truncate(value: &str, max_len: usize) -> &str {
    if value.len() <= max_len {
        return value;
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

/// Turns `name` into a valid RFC 1123 DNS name: lowercase, only `[a-z0-9.-]`,
/// starting and ending with an alphanumeric character.
pub fn dns_name(name: &str) -> String {
    let name = name
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '.' | '-' => c,
            _ => '-',
        })
        .collect::<String>();
    name.trim_matches(|c: char| !c.is_ascii_alphanumeric())
        .to_string()
}
