//! Well-known labels attached to every generated object.

use std::collections::BTreeMap;

use stackable_operator::kube::api::ObjectMeta;

use crate::naming::truncate;

pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";
pub const LABEL_INSTANCE: &str = "app.kubernetes.io/instance";
pub const LABEL_PART_OF: &str = "app.kubernetes.io/part-of";
pub const LABEL_COMPONENT: &str = "app.kubernetes.io/component";
pub const LABEL_NAME: &str = "app.kubernetes.io/name";
pub const LABEL_VERSION: &str = "app.kubernetes.io/version";

pub const MANAGED_BY: &str = "opentelemetry-operator";
pub const PART_OF: &str = "opentelemetry";

const LABEL_VALUE_MAX_LENGTH: usize = 63;

/// Labels for an object called `name` that belongs to `instance`.
///
/// The instance's own labels are carried over, except for those matched by `filter`.
/// An entry in `filter` matches a label key exactly, or as a prefix if it ends with `*`.
pub fn labels(
    instance: &ObjectMeta,
    name: &str,
    image: &str,
    component: &str,
    filter: &[String],
) -> BTreeMap<String, String> {
    let mut labels = instance
        .labels
        .iter()
        .flatten()
        .filter(|(key, _)| !is_filtered(key, filter))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect::<BTreeMap<_, _>>();
    labels.extend(selector_labels(instance, component));
    labels.insert(LABEL_NAME.to_string(), label_value(name));
    labels.insert(LABEL_VERSION.to_string(), image_version(image));
    labels
}

/// The subset of [`labels`] that is stable across upgrades, used in selectors.
pub fn selector_labels(instance: &ObjectMeta, component: &str) -> BTreeMap<String, String> {
    [
        (LABEL_MANAGED_BY, MANAGED_BY.to_string()),
        (LABEL_INSTANCE, instance_label(instance)),
        (LABEL_PART_OF, PART_OF.to_string()),
        (LABEL_COMPONENT, label_value(component)),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value))
    .collect()
}

fn instance_label(instance: &ObjectMeta) -> String {
    label_value(&format!(
        "{}.{}",
        instance.namespace.as_deref().unwrap_or_default(),
        instance.name.as_deref().unwrap_or_default()
    ))
}

fn is_filtered(key: &str, filter: &[String]) -> bool {
    filter.iter().any(|pattern| match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => key == pattern,
    })
}

/// The tag of `image`, or `latest` if it has none.
fn image_version(image: &str) -> String {
    // Only look past the last `/` so that registry ports aren't mistaken for tags
    let last_segment = image.rsplit('/').next().unwrap_or_default();
    match last_segment.rsplit_once(':') {
        Some((_, tag)) if !tag.is_empty() => label_value(tag),
        _ => "latest".to_string(),
    }
}

/// Coerces `value` into a valid label value.
fn label_value(value: &str) -> String {
    let value = value
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '-',
        })
        .collect::<String>();
    truncate(&value, LABEL_VALUE_MAX_LENGTH)
        .trim_matches(|c: char| !c.is_ascii_alphanumeric())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance() -> ObjectMeta {
        ObjectMeta {
            name: Some("my-col".to_string()),
            namespace: Some("obs".to_string()),
            labels: Some(
                [
                    ("team", "observability"),
                    ("example.com/cost-center", "42"),
                    ("example.com/owner", "alice"),
                ]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ),
            ..ObjectMeta::default()
        }
    }

    #[test]
    fn well_known_labels() {
        let labels = labels(
            &instance(),
            "my-col-targetallocator",
            "ghcr.io/otel/ta:0.98.0",
            "opentelemetry-targetallocator",
            &[],
        );
        assert_eq!(labels[LABEL_MANAGED_BY], "opentelemetry-operator");
        assert_eq!(labels[LABEL_INSTANCE], "obs.my-col");
        assert_eq!(labels[LABEL_PART_OF], "opentelemetry");
        assert_eq!(labels[LABEL_COMPONENT], "opentelemetry-targetallocator");
        assert_eq!(labels[LABEL_NAME], "my-col-targetallocator");
        assert_eq!(labels[LABEL_VERSION], "0.98.0");
        assert_eq!(labels["team"], "observability");
    }

    #[test]
    fn well_known_labels_override_instance_labels() {
        let mut meta = instance();
        meta.labels
            .get_or_insert_with(BTreeMap::new)
            .insert(LABEL_PART_OF.to_string(), "something-else".to_string());
        let labels = labels(&meta, "x", "", "c", &[]);
        assert_eq!(labels[LABEL_PART_OF], "opentelemetry");
    }

    #[test]
    fn filters_instance_labels() {
        let labels = labels(
            &instance(),
            "x",
            "",
            "c",
            &["team".to_string(), "example.com/*".to_string()],
        );
        assert!(!labels.contains_key("team"));
        assert!(!labels.contains_key("example.com/cost-center"));
        assert!(!labels.contains_key("example.com/owner"));
        assert_eq!(labels[LABEL_NAME], "x");
    }

    #[test]
    fn image_versions() {
        assert_eq!(image_version(""), "latest");
        assert_eq!(image_version("otel/ta"), "latest");
        assert_eq!(image_version("otel/ta:1.2.3"), "1.2.3");
        assert_eq!(image_version("localhost:5000/otel/ta"), "latest");
        assert_eq!(image_version("localhost:5000/otel/ta:main"), "main");
    }

    #[test]
    fn selector_labels_are_a_subset() {
        let all = labels(&instance(), "x", "ta:1", "c", &[]);
        for (key, value) in selector_labels(&instance(), "c") {
            assert_eq!(all.get(&key), Some(&value));
        }
    }

    #[test]
    fn labels_are_deterministic() {
        assert_eq!(
            labels(&instance(), "x", "ta:1", "c", &[]),
            labels(&instance(), "x", "ta:1", "c", &[])
        );
    }
}
