use serde_json::{Value, json};

use crate::domain::Triplet;

pub const TOPIC_CLASSIFICATION: &str = "topicClassification";
pub const CITATION_CONTEXT: &str = "https://dataverse.org/schema/citation/";

/// Keys of the fetched version document owned by the server. They must not
/// be echoed back on a draft-version update.
const SERVER_MANAGED_KEYS: [&str; 10] = [
    "id",
    "versionNumber",
    "versionMinorNumber",
    "versionState",
    "productionDate",
    "lastUpdateTime",
    "releaseTime",
    "createTime",
    "UNF",
    "files",
];

/// Converts parsed component groups into triplets, dropping any group that
/// is not a well-formed triplet. Input order is preserved.
pub fn triplets_from_groups(groups: &[Vec<String>]) -> Vec<Triplet> {
    groups
        .iter()
        .filter_map(|group| Triplet::from_components(group))
        .collect()
}

/// Builds the JSON-LD replacement document for the topic-classification
/// field, as sent to the metadata endpoint with `replace=false`.
pub fn build_topic_payload(triplets: &[Triplet]) -> Value {
    let entries: Vec<Value> = triplets
        .iter()
        .map(|triplet| {
            json!({
                "citation:topicClassValue": triplet.value,
                "citation:topicClassVocab": triplet.vocabulary,
                "citation:topicClassVocabURI": triplet.vocabulary_uri,
            })
        })
        .collect();

    json!({
        "citation:topicClassification": entries,
        "@context": {
            "citation": CITATION_CONTEXT,
        },
    })
}

/// Builds the native compound `topicClassification` field used when the
/// full draft version document is replaced.
pub fn topic_classification_field(triplets: &[Triplet]) -> Value {
    let entries: Vec<Value> = triplets
        .iter()
        .map(|triplet| {
            json!({
                "topicClassValue": {
                    "typeName": "topicClassValue",
                    "multiple": false,
                    "typeClass": "primitive",
                    "value": triplet.value,
                },
                "topicClassVocab": {
                    "typeName": "topicClassVocab",
                    "multiple": false,
                    "typeClass": "primitive",
                    "value": triplet.vocabulary,
                },
                "topicClassVocabURI": {
                    "typeName": "topicClassVocabURI",
                    "multiple": false,
                    "typeClass": "primitive",
                    "value": triplet.vocabulary_uri,
                },
            })
        })
        .collect();

    json!({
        "typeName": TOPIC_CLASSIFICATION,
        "multiple": true,
        "typeClass": "compound",
        "value": entries,
    })
}

/// Order-preserving view over a metadata block's `fields` array, keyed by
/// each field's `typeName`.
#[derive(Debug, Clone, Default)]
pub struct FieldList {
    fields: Vec<Value>,
}

impl FieldList {
    pub fn new(fields: Vec<Value>) -> Self {
        Self { fields }
    }

    pub fn position(&self, type_name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|field| field.get("typeName").and_then(Value::as_str) == Some(type_name))
    }

    /// Replaces the existing field with the same `typeName` wholesale, or
    /// appends the field when no such entry exists.
    pub fn replace_or_append(&mut self, field: Value) {
        let type_name = field
            .get("typeName")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        match self.position(&type_name) {
            Some(index) => self.fields[index] = field,
            None => self.fields.push(field),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_inner(self) -> Vec<Value> {
        self.fields
    }
}

/// Turns a fetched `latestVersion` document into the draft-version update
/// payload: server-managed keys are stripped and the citation block's
/// topic-classification field is replaced with one built from `triplets`.
/// Any topic values already on the dataset are discarded.
pub fn prepare_draft_payload(latest_version: &Value, triplets: &[Triplet]) -> Value {
    let mut payload = latest_version.clone();

    if let Some(object) = payload.as_object_mut() {
        for key in SERVER_MANAGED_KEYS {
            object.remove(key);
        }
    }

    let existing = payload
        .pointer("/metadataBlocks/citation/fields")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let mut fields = FieldList::new(existing);
    fields.replace_or_append(topic_classification_field(triplets));

    if let Some(citation) = payload
        .pointer_mut("/metadataBlocks/citation")
        .and_then(Value::as_object_mut)
    {
        citation.insert("fields".to_string(), Value::Array(fields.into_inner()));
    }

    payload
}
