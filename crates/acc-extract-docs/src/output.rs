//! Output tables: one row per document, one row per custom attribute

use std::path::Path;

use serde::Serialize;

use acc_extract_core::CsvSink;

use crate::schema::EnrichedDocument;

pub const DOCUMENTS_FILE: &str = "documents_documents.csv";
pub const CUSTOM_ATTRIBUTES_FILE: &str = "documents_custom_attributes.csv";

pub const DOCUMENT_COLUMNS: &[&str] = &[
    "id",
    "bim360_project_id",
    "name",
    "path",
    "version_number",
    "created_at",
    "created_by",
    "created_by_name",
    "updated_at",
    "updated_by",
    "updated_by_name",
    "storage_size",
    "hidden",
    "type",
    "versioned_urn",
    "web_link",
    "parent_id",
];

pub const CUSTOM_ATTRIBUTE_COLUMNS: &[&str] = &[
    "document_id",
    "bim360_project_id",
    "attribute_id",
    "attribute_type",
    "name",
    "value",
];

/// Row of `documents_documents.csv`; field order must match [`DOCUMENT_COLUMNS`]
#[derive(Debug, Serialize, PartialEq)]
pub struct DocumentRow<'a> {
    pub id: &'a str,
    #[serde(rename = "bim360_project_id")]
    pub project_id: &'a str,
    pub name: Option<&'a str>,
    pub path: Option<&'a str>,
    pub version_number: Option<u32>,
    pub created_at: Option<&'a str>,
    pub created_by: Option<&'a str>,
    pub created_by_name: Option<&'a str>,
    pub updated_at: Option<&'a str>,
    pub updated_by: Option<&'a str>,
    pub updated_by_name: Option<&'a str>,
    pub storage_size: Option<u64>,
    pub hidden: Option<bool>,
    #[serde(rename = "type")]
    pub kind: Option<&'a str>,
    pub versioned_urn: Option<&'a str>,
    pub web_link: Option<&'a str>,
    pub parent_id: Option<&'a str>,
}

impl<'a> From<&'a EnrichedDocument> for DocumentRow<'a> {
    fn from(doc: &'a EnrichedDocument) -> Self {
        let attrs = &doc.item.attributes;
        let version = doc.version.as_ref();
        Self {
            id: &doc.item.id,
            project_id: &doc.project_id,
            name: attrs.display_name.as_deref(),
            path: attrs.path_in_project.as_deref(),
            version_number: version.and_then(|v| v.number),
            created_at: attrs.create_time.as_deref(),
            created_by: attrs.create_user_id.as_deref(),
            created_by_name: attrs.create_user_name.as_deref(),
            updated_at: attrs.last_modified_time.as_deref(),
            updated_by: attrs.last_modified_user_id.as_deref(),
            updated_by_name: attrs.last_modified_user_name.as_deref(),
            storage_size: version.and_then(|v| v.storage_size),
            hidden: attrs.hidden,
            kind: attrs.extension.kind.as_deref(),
            versioned_urn: version.map(|v| v.urn.as_str()).filter(|u| !u.is_empty()),
            web_link: doc.item.web_link(),
            parent_id: doc.item.parent_id(),
        }
    }
}

/// Row of `documents_custom_attributes.csv`
#[derive(Debug, Serialize, PartialEq)]
pub struct CustomAttributeRow<'a> {
    pub document_id: &'a str,
    #[serde(rename = "bim360_project_id")]
    pub project_id: &'a str,
    pub attribute_id: String,
    pub attribute_type: Option<&'a str>,
    pub name: Option<&'a str>,
    pub value: String,
}

/// Flatten the custom attributes of every document, in document order
pub fn custom_attribute_rows(docs: &[EnrichedDocument]) -> impl Iterator<Item = CustomAttributeRow<'_>> {
    docs.iter().flat_map(|doc| {
        doc.version
            .iter()
            .flat_map(|v| v.custom_attributes.iter())
            .map(move |attr| CustomAttributeRow {
                document_id: &doc.item.id,
                project_id: &doc.project_id,
                attribute_id: attr.id_text(),
                attribute_type: attr.kind.as_deref(),
                name: attr.name.as_deref(),
                value: attr.value_text(),
            })
    })
}

/// Rows written per table
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OutputSummary {
    pub documents: usize,
    pub custom_attributes: usize,
}

/// Write both tables into `output_dir`
pub fn write_outputs(output_dir: &Path, docs: &[EnrichedDocument]) -> std::io::Result<OutputSummary> {
    std::fs::create_dir_all(output_dir)?;

    let mut sink = CsvSink::new(output_dir, DOCUMENTS_FILE, DOCUMENT_COLUMNS)?;
    for doc in docs {
        sink.write_row(&DocumentRow::from(doc))?;
    }
    let path = sink.path().to_path_buf();
    let documents = sink.finalize()?;
    log::info!("Wrote {documents} rows to {}", path.display());

    let mut sink = CsvSink::new(output_dir, CUSTOM_ATTRIBUTES_FILE, CUSTOM_ATTRIBUTE_COLUMNS)?;
    for row in custom_attribute_rows(docs) {
        sink.write_row(&row)?;
    }
    let path = sink.path().to_path_buf();
    let custom_attributes = sink.finalize()?;
    log::info!("Wrote {custom_attributes} rows to {}", path.display());

    Ok(OutputSummary {
        documents,
        custom_attributes,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::schema::{CustomAttribute, ItemAttributes, ItemRecord, VersionDetail};

    fn document(id: &str, version: Option<VersionDetail>) -> EnrichedDocument {
        EnrichedDocument {
            project_id: "P1".to_string(),
            item: ItemRecord {
                id: id.to_string(),
                attributes: ItemAttributes {
                    display_name: Some(format!("{id}.pdf")),
                    hidden: Some(false),
                    ..Default::default()
                },
                ..Default::default()
            },
            version,
        }
    }

    fn attribute(id: i64, name: &str, value: serde_json::Value) -> CustomAttribute {
        CustomAttribute {
            id: json!(id),
            kind: Some("string".to_string()),
            name: Some(name.to_string()),
            value,
        }
    }

    fn serialized_header<S: Serialize>(row: &S) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.serialize(row).unwrap();
        let text = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        text.lines().next().unwrap().to_string()
    }

    #[test]
    fn row_fields_match_table_columns() {
        let doc = document("A", None);
        assert_eq!(
            serialized_header(&DocumentRow::from(&doc)),
            DOCUMENT_COLUMNS.join(",")
        );
        let row = CustomAttributeRow {
            document_id: "A",
            project_id: "P1",
            attribute_id: "1".to_string(),
            attribute_type: None,
            name: None,
            value: String::new(),
        };
        assert_eq!(serialized_header(&row), CUSTOM_ATTRIBUTE_COLUMNS.join(","));
    }

    #[test]
    fn version_fields_empty_without_version() {
        let doc = document("B", None);
        let row = DocumentRow::from(&doc);
        assert_eq!(row.version_number, None);
        assert_eq!(row.storage_size, None);
        assert_eq!(row.versioned_urn, None);
        assert_eq!(row.name, Some("B.pdf"));
    }

    #[test]
    fn version_fields_filled_from_details() {
        let doc = document(
            "A",
            Some(VersionDetail {
                urn: "vf.A?version=2".to_string(),
                item_urn: "A".to_string(),
                number: Some(2),
                storage_size: Some(99),
                custom_attributes: vec![],
            }),
        );
        let row = DocumentRow::from(&doc);
        assert_eq!(row.version_number, Some(2));
        assert_eq!(row.storage_size, Some(99));
        assert_eq!(row.versioned_urn, Some("vf.A?version=2"));
    }

    #[test]
    fn custom_attributes_flattened_with_document_ids() {
        let docs = vec![
            document(
                "A",
                Some(VersionDetail {
                    item_urn: "A".to_string(),
                    custom_attributes: vec![
                        attribute(1, "Discipline", json!("MEP")),
                        attribute(2, "Sheet", json!(12)),
                    ],
                    ..Default::default()
                }),
            ),
            document("B", None),
        ];
        let rows: Vec<_> = custom_attribute_rows(&docs).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].document_id, "A");
        assert_eq!(rows[0].project_id, "P1");
        assert_eq!(rows[0].attribute_id, "1");
        assert_eq!(rows[0].value, "MEP");
        assert_eq!(rows[1].value, "12");
    }

    #[test]
    fn writes_both_tables() {
        let dir = tempfile::tempdir().unwrap();
        let docs = vec![document("A", None)];
        let summary = write_outputs(dir.path(), &docs).unwrap();
        assert_eq!(
            summary,
            OutputSummary {
                documents: 1,
                custom_attributes: 0
            }
        );

        let bytes = std::fs::read(dir.path().join(DOCUMENTS_FILE)).unwrap();
        assert!(bytes.starts_with(b"\xEF\xBB\xBF"));
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        let mut lines = text.split("\r\n");
        assert_eq!(lines.next(), Some(DOCUMENT_COLUMNS.join(",").as_str()));
        assert_eq!(lines.next(), Some("A,P1,A.pdf,,,,,,,,,,false,,,,"));

        let attrs = std::fs::read(dir.path().join(CUSTOM_ATTRIBUTES_FILE)).unwrap();
        assert_eq!(
            &attrs[3..],
            format!("{}\r\n", CUSTOM_ATTRIBUTE_COLUMNS.join(",")).as_bytes()
        );
    }
}
