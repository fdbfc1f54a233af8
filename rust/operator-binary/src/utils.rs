use std::fmt::{LowerHex, Write as _};

use serde::Serialize;

/// Formats bytes as lowercase hex, used for digests in names and annotations.
pub struct FmtByteSlice<'a>(pub &'a [u8]);

impl LowerHex for FmtByteSlice<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.iter().try_for_each(|byte| write!(f, "{byte:02x}"))
    }
}

/// Joins the messages of `err` and its sources, for logging a failed build on one line.
pub fn error_full_message(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(message, ": {cause}");
        source = cause.source();
    }
    message
}

/// Serializes each item as its own document of a multi-document YAML stream.
///
/// An empty input produces an empty stream.
pub fn to_yaml_stream<T: Serialize>(
    documents: impl IntoIterator<Item = T>,
) -> Result<String, serde_yaml::Error> {
    let mut stream = String::new();
    for doc in documents {
        stream.push_str("---\n");
        stream.push_str(&serde_yaml::to_string(&doc)?);
    }
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use openssl::sha::sha256;

    use super::{error_full_message, to_yaml_stream, FmtByteSlice};
    use crate::manifests::{config_map, Error, StepError};

    #[test]
    fn fmt_sha256_digest() {
        assert_eq!(
            format!("{:x}", FmtByteSlice(&sha256(b""))),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(format!("{:x}", FmtByteSlice(&[])), "");
    }

    #[test]
    fn full_message_of_manifest_error() {
        let err = Error::BuildManifest {
            step: "ConfigMap",
            source: StepError::ConfigMap {
                source: config_map::Error::InvalidScrapeConfig { index: 2 },
            },
        };
        assert_eq!(
            error_full_message(&err),
            "failed to build ConfigMap for the TargetAllocator: \
             invalid TargetAllocator configuration: \
             scrape config #2 must be a mapping with a string job_name"
        );
        assert_eq!(
            error_full_message(&config_map::Error::InvalidScrapeConfig { index: 0 }),
            "scrape config #0 must be a mapping with a string job_name"
        );
    }

    #[test]
    fn yaml_stream_separates_documents() {
        let docs = [
            BTreeMap::from([("kind", "ConfigMap")]),
            BTreeMap::from([("kind", "Service")]),
        ];
        assert_eq!(
            to_yaml_stream(&docs).unwrap(),
            "---\nkind: ConfigMap\n---\nkind: Service\n"
        );
        assert_eq!(to_yaml_stream(Vec::<()>::new()).unwrap(), "");
    }
}
