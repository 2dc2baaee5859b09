//! Document — the TOML schema for filter configurations.
//!
//! The serde structs here mirror the file layout only. Conversion to and
//! from [`FilterConfiguration`] goes through a registry keyed by `kind`, so
//! parameter checks live in one place per kind.

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::model::{
    FilterConfiguration, MessageTypeFilterConfiguration, PastFilterConfiguration, SourceTags,
    TagPolicy, TaggingConfiguration, TaggingFilterConfiguration,
};
use crate::packet::SourceType;

/// One `[[filters]]` entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_ids: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagging: Option<TaggingDocument>,
}

/// The `[filters.tagging]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaggingDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_bs: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// `LIVE` or `SAT`
    pub source_type: Option<SourceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_region: Option<String>,
}

/// A whole pipeline file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineDocument {
    #[serde(default)]
    pub filters: Vec<FilterDocument>,
}

struct Registration {
    kind: &'static str,
    decode: fn(&FilterDocument) -> Result<FilterConfiguration, ConfigError>,
}

const REGISTRY: &[Registration] = &[
    Registration {
        kind: PastFilterConfiguration::KIND,
        decode: decode_past,
    },
    Registration {
        kind: TaggingFilterConfiguration::KIND,
        decode: decode_tagging,
    },
    Registration {
        kind: MessageTypeFilterConfiguration::KIND,
        decode: decode_message_type,
    },
];

/// Every `kind` the registry knows.
pub fn kinds() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|r| r.kind)
}

pub fn decode(doc: &FilterDocument) -> Result<FilterConfiguration, ConfigError> {
    let kind = doc.kind.as_deref().ok_or(ConfigError::MissingKind)?;
    let registration = REGISTRY
        .iter()
        .find(|r| r.kind == kind)
        .ok_or_else(|| ConfigError::UnknownKind(kind.to_string()))?;
    let config = (registration.decode)(doc)?;
    config.validate()?;
    Ok(config)
}

pub fn encode(config: &FilterConfiguration) -> FilterDocument {
    let mut doc = FilterDocument {
        kind: Some(config.kind().to_string()),
        ..Default::default()
    };
    match config {
        FilterConfiguration::Past(c) => {
            doc.threshold_ms = Some(i64::try_from(c.threshold_ms).unwrap_or(i64::MAX));
        }
        FilterConfiguration::Tagging(c) => {
            let tags = &c.tagging.tags;
            doc.tagging = Some(TaggingDocument {
                policy: Some(c.tagging.policy.as_str().to_string()),
                source_id: tags.source_id.clone(),
                source_bs: tags.source_bs.map(i64::from),
                source_country: tags.source_country.clone(),
                source_type: tags.source_type,
                source_region: tags.source_region.clone(),
            });
        }
        FilterConfiguration::MessageType(c) => {
            doc.message_ids = Some(c.message_ids.iter().map(|&id| i64::from(id)).collect());
        }
    }
    doc
}

pub fn decode_all(docs: &[FilterDocument]) -> Result<Vec<FilterConfiguration>, ConfigError> {
    docs.iter().map(decode).collect()
}

/// Parse a TOML document holding `[[filters]]` entries.
pub fn parse_pipeline(text: &str) -> Result<Vec<FilterConfiguration>, ConfigError> {
    let doc: PipelineDocument = toml::from_str(text)?;
    decode_all(&doc.filters)
}

pub fn render_pipeline(configs: &[FilterConfiguration]) -> Result<String, toml::ser::Error> {
    let doc = PipelineDocument {
        filters: configs.iter().map(encode).collect(),
    };
    toml::to_string(&doc)
}

fn reject_extra(doc: &FilterDocument, kind: &'static str) -> Result<(), ConfigError> {
    let extra = [
        ("threshold_ms", doc.threshold_ms.is_some() && kind != PastFilterConfiguration::KIND),
        ("message_ids", doc.message_ids.is_some() && kind != MessageTypeFilterConfiguration::KIND),
        ("tagging", doc.tagging.is_some() && kind != TaggingFilterConfiguration::KIND),
    ];
    match extra.iter().find(|(_, present)| *present) {
        Some((parameter, _)) => Err(ConfigError::invalid(kind, *parameter, "not used by this kind")),
        None => Ok(()),
    }
}

fn decode_past(doc: &FilterDocument) -> Result<FilterConfiguration, ConfigError> {
    let kind = PastFilterConfiguration::KIND;
    reject_extra(doc, kind)?;
    let config = match doc.threshold_ms {
        None => PastFilterConfiguration::default(),
        Some(ms) => {
            let ms = u64::try_from(ms)
                .map_err(|_| ConfigError::invalid(kind, "threshold_ms", format!("{} is negative", ms)))?;
            PastFilterConfiguration::new(ms)
        }
    };
    Ok(FilterConfiguration::Past(config))
}

fn decode_tagging(doc: &FilterDocument) -> Result<FilterConfiguration, ConfigError> {
    let kind = TaggingFilterConfiguration::KIND;
    reject_extra(doc, kind)?;
    let Some(tagging) = &doc.tagging else {
        return Ok(FilterConfiguration::Tagging(TaggingFilterConfiguration::default()));
    };

    let policy = match tagging.policy.as_deref() {
        None => TagPolicy::default(),
        Some(name) => TagPolicy::parse(name)
            .ok_or_else(|| ConfigError::invalid(kind, "policy", format!("unknown policy '{}'", name)))?,
    };
    let source_bs = tagging
        .source_bs
        .map(|bs| {
            u32::try_from(bs)
                .map_err(|_| ConfigError::invalid(kind, "source_bs", format!("{} is not an MMSI", bs)))
        })
        .transpose()?;
    let tags = SourceTags {
        source_id: tagging.source_id.clone(),
        source_bs,
        source_country: tagging.source_country.clone(),
        source_type: tagging.source_type,
        source_region: tagging.source_region.clone(),
    };
    Ok(FilterConfiguration::Tagging(TaggingFilterConfiguration::new(
        TaggingConfiguration::new(policy, tags),
    )))
}

fn decode_message_type(doc: &FilterDocument) -> Result<FilterConfiguration, ConfigError> {
    let kind = MessageTypeFilterConfiguration::KIND;
    reject_extra(doc, kind)?;
    let ids = doc
        .message_ids
        .as_deref()
        .ok_or_else(|| ConfigError::invalid(kind, "message_ids", "is required"))?;
    let ids = ids
        .iter()
        .map(|&id| {
            u8::try_from(id)
                .map_err(|_| ConfigError::invalid(kind, "message_ids", format!("{} is not a message id", id)))
        })
        .collect::<Result<Vec<u8>, _>>()?;
    Ok(FilterConfiguration::MessageType(MessageTypeFilterConfiguration::new(ids)))
}
