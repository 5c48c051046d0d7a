//! HTTP request samples.

use super::timer::TimerSample;
use crate::sizing::{self, EstimatedSize, MemorySizer};
use crate::utils::config::MAX_URI_LENGTH;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Timing of one HTTP request, with optional request context
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HttpSample {
    pub timer: TimerSample,

    /// Request URI, at most `MAX_URI_LENGTH` characters
    #[serde(deserialize_with = "deserialize_uri")]
    uri: String,

    /// GET, POST, ...
    pub request_method: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_attributes: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<BTreeMap<String, Vec<String>>>,
}

/// Truncate `uri` to `MAX_URI_LENGTH` characters
fn cap_uri(mut uri: String) -> String {
    if let Some((byte_index, _)) = uri.char_indices().nth(MAX_URI_LENGTH) {
        uri.truncate(byte_index);
    }
    uri
}

fn deserialize_uri<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(cap_uri)
}

impl HttpSample {
    pub fn new(timer: TimerSample, uri: impl Into<String>, request_method: impl Into<String>) -> Self {
        Self {
            timer,
            uri: cap_uri(uri.into()),
            request_method: request_method.into(),
            headers: None,
            attributes: None,
            session_attributes: None,
            parameters: None,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Replace the URI, truncating it to `MAX_URI_LENGTH` characters
    pub fn set_uri(&mut self, uri: impl Into<String>) {
        self.uri = cap_uri(uri.into());
    }

    /// Builder-style header insertion
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Builder-style request parameter insertion
    pub fn with_parameter(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.parameters
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), values);
        self
    }
}

impl EstimatedSize for HttpSample {
    fn estimated_size(&self, sizer: &dyn MemorySizer, align: bool) -> u64 {
        let mut size = self.timer.estimated_size(sizer, false);
        // uri, method, headers, attributes, session attributes, parameters
        size += sizer.primitive_sizes(0, 0, 0, 0, 6, 0);
        size += sizer.size_of_string(&self.uri);
        size += sizer.size_of_string(&self.request_method);
        size += sizing::string_map(sizer, self.headers.as_ref());
        size += sizing::string_map(sizer, self.attributes.as_ref());
        size += sizing::string_map(sizer, self.session_attributes.as_ref());
        size += sizing::multi_string_map(sizer, self.parameters.as_ref());
        sizing::finish(sizer, size, align)
    }
}
