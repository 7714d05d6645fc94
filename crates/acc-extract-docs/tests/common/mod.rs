//! Scripted API and fixtures shared by the pipeline tests
#![allow(dead_code)]

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use serde_json::{Value, json};
use tempfile::TempDir;

use acc_extract_core::{ApiError, ApiRequest, ApiResponse, Transport};
use acc_extract_docs::{Config, Credentials, InputSource};

pub const BOM: &[u8] = b"\xEF\xBB\xBF";

pub type Handler = dyn Fn(&ApiRequest, &[String]) -> Option<ApiResponse>;

/// Answers token, listing and batch-get calls; `override_with` can
/// replace any answer before the default one is built.
#[derive(Clone)]
pub struct ScriptedApi {
    pub calls: Rc<RefCell<Vec<ApiRequest>>>,
    pub override_with: Rc<Handler>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::with_override(|_, _| None)
    }

    pub fn with_override(f: impl Fn(&ApiRequest, &[String]) -> Option<ApiResponse> + 'static) -> Self {
        Self {
            calls: Rc::new(RefCell::new(Vec::new())),
            override_with: Rc::new(f),
        }
    }

    pub fn count(&self, suffix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|r| r.url.ends_with(suffix))
            .count()
    }
}

impl Transport for ScriptedApi {
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        self.calls.borrow_mut().push(request.clone());
        let urns = requested_urns(request);
        if let Some(resp) = (self.override_with)(request, &urns) {
            return Ok(resp);
        }

        let body = if request.url.ends_with("/authentication/v2/token") {
            json!({ "access_token": "tok", "token_type": "Bearer", "expires_in": 3599 })
        } else if request.url.ends_with("/commands") {
            let included: Vec<Value> = urns
                .iter()
                .map(|urn| {
                    json!({
                        "type": "items",
                        "id": urn,
                        "attributes": {
                            "displayName": format!("{urn}.pdf"),
                            "hidden": false,
                            "pathInProject": "/Project Files",
                            "extension": { "type": "items:autodesk.bim360:File" }
                        }
                    })
                })
                .collect();
            json!({ "data": { "type": "commands" }, "included": included })
        } else {
            let results: Vec<Value> = urns
                .iter()
                .map(|urn| {
                    json!({
                        "urn": format!("{urn}?version=1"),
                        "itemUrn": urn,
                        "number": 1,
                        "storageSize": 10,
                        "customAttributes": [
                            { "id": 7, "type": "string", "name": "Status", "value": "IFC" }
                        ]
                    })
                })
                .collect();
            json!({ "results": results })
        };
        Ok(ok(&body))
    }
}

pub fn ok(body: &Value) -> ApiResponse {
    ApiResponse {
        status: 200,
        headers: Vec::new(),
        body: body.to_string(),
    }
}

/// urns named by a listing or batch-get body
pub fn requested_urns(request: &ApiRequest) -> Vec<String> {
    let Some(body) = &request.body else {
        return Vec::new();
    };
    let Ok(parsed) = serde_json::from_str::<Value>(&body.data) else {
        return Vec::new();
    };
    let ids = parsed["data"]["relationships"]["resources"]["data"]
        .as_array()
        .map(|r| r.iter().map(|x| &x["id"]).collect::<Vec<_>>())
        .or_else(|| parsed["urns"].as_array().map(|u| u.iter().collect()))
        .unwrap_or_default();
    ids.into_iter()
        .filter_map(|v| v.as_str().map(String::from))
        .collect()
}

/// issues: P1 -> A, B. reviews: P1 -> B, C and an empty project P2.
pub fn write_inputs(dir: &Path) -> Vec<InputSource> {
    std::fs::write(
        dir.join("issues_issues.csv"),
        "\u{feff}bim360_project_id,linked_document_urn\r\nP1,A\r\nP1,B\r\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("reviews_review_documents.csv"),
        "bim360_project_id,lineage_urn\nP1,B\nP1,C\nP2,\n",
    )
    .unwrap();
    vec![
        InputSource::new(
            dir.join("issues_issues.csv"),
            "bim360_project_id",
            "linked_document_urn",
        ),
        InputSource::new(
            dir.join("reviews_review_documents.csv"),
            "bim360_project_id",
            "lineage_urn",
        ),
    ]
}

pub fn config(dir: &TempDir, chunk_size: usize) -> Config {
    Config {
        credentials: Credentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            ..Default::default()
        },
        base_url: "https://api.test".to_string(),
        inputs: write_inputs(dir.path()),
        output_dir: dir.path().join("out"),
        chunk_size,
        ..Default::default()
    }
}

/// Data rows of an output table, BOM and header stripped
pub fn data_rows(path: &Path) -> Vec<String> {
    let bytes = std::fs::read(path).unwrap();
    assert!(bytes.starts_with(BOM), "{} lacks BOM", path.display());
    let text = String::from_utf8(bytes[BOM.len()..].to_vec()).unwrap();
    assert!(!text.contains("\r\n\n") && text.ends_with("\r\n"));
    text.split("\r\n")
        .skip(1)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

pub fn no_sleep(_: Duration) {}
