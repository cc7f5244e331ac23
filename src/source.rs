//! Device record sources.
//!
//! The resolver consumes plain [`DeviceRecord`]s; where they come from is a
//! [`RecordSource`]. The stock source reads the XML catalog format:
//!
//! ```text
//! <wurfl>
//!   <devices>
//!     <device id="..." fall_back="..." user_agent="..." actual_device_root="true">
//!       <group id="product_info">
//!         <capability name="brand_name" value="Acme"/>
//!       </group>
//!     </device>
//!   </devices>
//! </wurfl>
//! ```
//!
//! `<device>` elements are collected in document order wherever they appear.
//! Only `id` is required; the other attributes default to empty or false.

use crate::error::SourceError;
use crate::{Capability, CapabilityGroup, DeviceRecord};
use roxmltree::{Document, Node};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Anything that can produce device records in source order.
pub trait RecordSource {
    fn records(&self) -> Result<Vec<DeviceRecord>, SourceError>;
}

impl RecordSource for Vec<DeviceRecord> {
    fn records(&self) -> Result<Vec<DeviceRecord>, SourceError> {
        Ok(self.clone())
    }
}

impl RecordSource for [DeviceRecord] {
    fn records(&self) -> Result<Vec<DeviceRecord>, SourceError> {
        Ok(self.to_vec())
    }
}

/// An XML catalog on disk.
#[derive(Debug, Clone)]
pub struct XmlFile {
    path: PathBuf,
}

impl XmlFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        XmlFile { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for XmlFile {
    fn records(&self) -> Result<Vec<DeviceRecord>, SourceError> {
        let text = fs::read_to_string(&self.path)?;
        let records = parse_records(&text)?;
        debug!(path = %self.path.display(), records = records.len(), "parsed device catalog");
        Ok(records)
    }
}

/// Parse every `<device>` element of an XML catalog.
pub fn parse_records(xml: &str) -> Result<Vec<DeviceRecord>, SourceError> {
    let doc = Document::parse(xml)?;
    doc.descendants().filter(|n| n.has_tag_name("device")).map(parse_device).collect()
}

fn parse_device(node: Node<'_, '_>) -> Result<DeviceRecord, SourceError> {
    let id = node.attribute("id").ok_or(SourceError::MissingAttribute { element: "device", attribute: "id" })?;

    let mut groups = Vec::new();
    for group in node.children().filter(|n| n.has_tag_name("group")) {
        let group_id =
            group.attribute("id").ok_or(SourceError::MissingAttribute { element: "group", attribute: "id" })?;
        let mut capabilities = Vec::new();
        for cap in group.children().filter(|n| n.has_tag_name("capability")) {
            let name = cap
                .attribute("name")
                .ok_or(SourceError::MissingAttribute { element: "capability", attribute: "name" })?;
            capabilities.push(Capability {
                name: name.to_string(),
                value: cap.attribute("value").unwrap_or_default().to_string(),
            });
        }
        groups.push(CapabilityGroup { id: group_id.to_string(), capabilities });
    }

    Ok(DeviceRecord {
        id: id.to_string(),
        fall_back: node.attribute("fall_back").unwrap_or_default().to_string(),
        user_agent: node.attribute("user_agent").unwrap_or_default().to_string(),
        actual_device_root: node.attribute("actual_device_root") == Some("true"),
        groups,
    })
}
