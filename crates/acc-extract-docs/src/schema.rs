//! Response types for the item listing and version batch-get endpoints.
//!
//! Only the fields the output tables need are modelled; everything else in
//! the payloads is ignored. Missing fields deserialize to their defaults.

use serde::Deserialize;
use serde_json::Value;

// =============================================================================
// Item listing (Data Management `commands`, ListItems)
// =============================================================================

/// Body of a ListItems command response; the items arrive in `included`
#[derive(Debug, Default, Deserialize)]
pub struct ListItemsResponse {
    #[serde(default)]
    pub included: Vec<ItemRecord>,
}

/// Item as returned by the listing. `id` is the lineage urn requested.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ItemRecord {
    pub id: String,
    #[serde(default)]
    pub attributes: ItemAttributes,
    #[serde(default)]
    pub links: ItemLinks,
    #[serde(default)]
    pub relationships: ItemRelationships,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemAttributes {
    pub display_name: Option<String>,
    pub create_time: Option<String>,
    pub create_user_id: Option<String>,
    pub create_user_name: Option<String>,
    pub last_modified_time: Option<String>,
    pub last_modified_user_id: Option<String>,
    pub last_modified_user_name: Option<String>,
    pub hidden: Option<bool>,
    pub extension: Extension,
    /// Present when the command asked for `includePathInProject`
    pub path_in_project: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Extension {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemLinks {
    pub web_view: Option<Link>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Link {
    pub href: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ItemRelationships {
    pub parent: Option<Relationship>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Relationship {
    pub data: Option<ResourceId>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResourceId {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub id: String,
}

impl ItemRecord {
    pub fn web_link(&self) -> Option<&str> {
        self.links.web_view.as_ref().map(|l| l.href.as_str())
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.relationships
            .parent
            .as_ref()
            .and_then(|p| p.data.as_ref())
            .map(|d| d.id.as_str())
    }
}

// =============================================================================
// Version details (Docs `versions:batch-get`)
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct BatchGetVersionsResponse {
    #[serde(default)]
    pub results: Vec<VersionDetail>,
}

/// Latest version of an item; joins to [`ItemRecord`] on `item_urn == id`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDetail {
    /// Versioned urn (`...?version=N`)
    #[serde(default)]
    pub urn: String,
    pub item_urn: String,
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub storage_size: Option<u64>,
    #[serde(default)]
    pub custom_attributes: Vec<CustomAttribute>,
}

/// Project-defined attribute attached to a document version
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CustomAttribute {
    pub id: Value,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    pub value: Value,
}

impl CustomAttribute {
    pub fn id_text(&self) -> String {
        value_text(&self.id)
    }

    pub fn value_text(&self) -> String {
        value_text(&self.value)
    }
}

/// Render a scalar JSON value as a table cell (strings unquoted, null empty)
fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// =============================================================================
// Joined record
// =============================================================================

/// Item joined with its version details, tagged with the owning project.
///
/// `version` is `None` when the batch-get returned nothing for the item.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedDocument {
    pub project_id: String,
    pub item: ItemRecord,
    pub version: Option<VersionDetail>,
}
