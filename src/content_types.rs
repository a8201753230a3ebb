//! Part content types from `[Content_Types].xml`.

use crate::error::{Error, Result};
use quick_xml::events::Event;
use std::collections::HashMap;

/// Path of the content-type table inside every OOXML package.
pub const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";

/// Content type for the PPTX presentation part.
pub const PRESENTATION_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";

/// Content type for a slide part.
pub const SLIDE_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";

/// Content type used when neither an override nor a default matches.
pub const FALLBACK_CONTENT_TYPE: &str = "application/xml";

/// Content-type table: per-part overrides and per-extension defaults.
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    defaults: HashMap<String, String>,
    overrides: HashMap<String, String>,
}

impl ContentTypes {
    /// Parse the XML of a `[Content_Types].xml` part.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut types = Self::default();
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) => {
                    let local = e.local_name();
                    let is_default = local.as_ref() == b"Default";
                    let is_override = local.as_ref() == b"Override";

                    let mut key = String::new();
                    let mut content_type = String::new();
                    if is_default || is_override {
                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"Extension" | b"PartName" => {
                                    key = String::from_utf8_lossy(&attr.value).to_string();
                                }
                                b"ContentType" => {
                                    content_type = String::from_utf8_lossy(&attr.value).to_string();
                                }
                                _ => {}
                            }
                        }
                    }

                    if !key.is_empty() && !content_type.is_empty() {
                        if is_default {
                            types.defaults.insert(key.to_lowercase(), content_type);
                        } else {
                            let part = key.trim_start_matches('/').to_string();
                            types.overrides.insert(part, content_type);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::malformed_xml(CONTENT_TYPES_PATH, e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(types)
    }

    /// Content type of a part path (without a leading slash).
    pub fn content_type_for(&self, path: &str) -> &str {
        let path = path.trim_start_matches('/');
        if let Some(ct) = self.overrides.get(path) {
            return ct;
        }

        let ext = path
            .rsplit('/')
            .next()
            .and_then(|file| file.rsplit_once('.'))
            .map(|(_, ext)| ext.to_lowercase());
        ext.and_then(|ext| self.defaults.get(&ext))
            .map(String::as_str)
            .unwrap_or(FALLBACK_CONTENT_TYPE)
    }
}
