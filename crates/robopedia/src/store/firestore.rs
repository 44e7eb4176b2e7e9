//! Firestore document database backend.
//!
//! Every record is one document in a collection named after [`Collection::key`].
//! Document ids are assigned by the server, so records are matched to documents
//! through their `id` field:
//!
//! - `save` lists the collection, `PATCH`es documents whose record is still present,
//!   `POST`s new records and `DELETE`s documents whose record is gone.
//! - `query` runs a structured `EQUAL` query server-side (by id, slug, flag...).
//!
//! Assets go to Firebase Storage when a bucket is configured.
//!
//! Firestore wraps every value in a typed envelope (`{"stringValue": "x"}`);
//! [`to_firestore_value`] and [`from_firestore_value`] convert between that and
//! plain JSON.

use super::backend::{Collection, StorageBackend};
use super::{mime_for_path, percent_encode};
use crate::config::FirestoreConfig;
use crate::error::{RobopediaError, Result};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::{debug, info};

const PAGE_SIZE: &str = "300";

#[derive(Debug, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<Document>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryRow {
    document: Option<Document>,
}

pub struct FirestoreBackend {
    client: Client,
    config: FirestoreConfig,
}

impl FirestoreBackend {
    pub fn new(config: FirestoreConfig) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client, config })
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.config.api_base.trim_end_matches('/'),
            self.config.project_id
        )
    }

    fn document_url(&self, name: &str) -> String {
        format!("{}/{}", self.config.api_base.trim_end_matches('/'), name)
    }

    fn authorized(&self, mut request: RequestBuilder) -> RequestBuilder {
        if let Some(key) = self.config.api_key.as_deref() {
            request = request.query(&[("key", key)]);
        }
        if let Some(token) = self.config.token.as_deref() {
            request = request.bearer_auth(token);
        }
        request
    }

    fn list_documents(&self, collection: Collection) -> Result<Vec<Document>> {
        let url = format!("{}/{}", self.documents_url(), collection.key());
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.client.get(&url).query(&[("pageSize", PAGE_SIZE)]);
            if let Some(token) = page_token.as_deref() {
                request = request.query(&[("pageToken", token)]);
            }
            let page: ListResponse = expect_success(self.authorized(request).send()?)?.json()?;
            documents.extend(page.documents);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(documents)
    }

    fn create_document(&self, collection: Collection, record: &Value) -> Result<String> {
        let url = format!("{}/{}", self.documents_url(), collection.key());
        let request = self
            .client
            .post(url)
            .json(&json!({ "fields": to_firestore_fields(record) }));
        let created: Document = expect_success(self.authorized(request).send()?)?.json()?;
        Ok(created.name)
    }

    fn replace_document(&self, name: &str, record: &Value) -> Result<()> {
        let request = self
            .client
            .patch(self.document_url(name))
            .json(&json!({ "fields": to_firestore_fields(record) }));
        expect_success(self.authorized(request).send()?)?;
        Ok(())
    }

    fn delete_document(&self, name: &str) -> Result<()> {
        let request = self.client.delete(self.document_url(name));
        expect_success(self.authorized(request).send()?)?;
        Ok(())
    }

    fn bucket(&self) -> Result<&str> {
        self.config
            .bucket
            .as_deref()
            .ok_or_else(|| RobopediaError::Store("No storage bucket configured".to_string()))
    }

    fn storage_object_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/b/{}/o/{}",
            self.config.storage_base.trim_end_matches('/'),
            bucket,
            percent_encode(path)
        )
    }

    /// Object path for a reference produced by `upload_asset`, or the reference
    /// itself when it is already a bare path.
    fn object_path(&self, bucket: &str, reference: &str) -> Option<String> {
        if !reference.contains("://") {
            return Some(reference.to_string());
        }
        let prefix = format!(
            "{}/b/{}/o/",
            self.config.storage_base.trim_end_matches('/'),
            bucket
        );
        let encoded = reference.strip_prefix(&prefix)?;
        let encoded = encoded.split('?').next().unwrap_or(encoded);
        Some(percent_decode(encoded))
    }
}

impl StorageBackend for FirestoreBackend {
    fn name(&self) -> &'static str {
        "firestore"
    }

    fn load(&self, collection: Collection) -> Result<Vec<Value>> {
        let records: Vec<Value> = self
            .list_documents(collection)?
            .into_iter()
            .map(|doc| from_firestore_fields(&doc.fields))
            .collect();
        debug!("Loaded {} {} documents", records.len(), collection);
        Ok(records)
    }

    fn save(&self, collection: Collection, records: &[Value]) -> Result<()> {
        let mut by_record_id: HashMap<String, Vec<String>> = HashMap::new();
        let mut orphans = Vec::new();
        for doc in self.list_documents(collection)? {
            match doc.fields.get("id").and_then(|v| v.get("stringValue")).and_then(Value::as_str) {
                Some(id) => by_record_id.entry(id.to_string()).or_default().push(doc.name),
                None => orphans.push(doc.name),
            }
        }

        let (mut created, mut replaced) = (0, 0);
        for record in records {
            let id = record.get("id").and_then(Value::as_str).unwrap_or_default();
            let existing = by_record_id.get_mut(id).and_then(|names| names.pop());
            match existing {
                Some(name) => {
                    self.replace_document(&name, record)?;
                    replaced += 1;
                }
                None => {
                    self.create_document(collection, record)?;
                    created += 1;
                }
            }
        }

        let stale: Vec<String> = by_record_id.into_values().flatten().chain(orphans).collect();
        for name in &stale {
            self.delete_document(name)?;
        }

        info!(
            "Saved {}: {} created, {} replaced, {} deleted",
            collection,
            created,
            replaced,
            stale.len()
        );
        Ok(())
    }

    fn query(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
        limit: Option<usize>,
    ) -> Result<Vec<Value>> {
        let url = format!("{}:runQuery", self.documents_url());
        let request = self
            .client
            .post(url)
            .json(&structured_query(collection, field, value, limit));
        let rows: Vec<QueryRow> = expect_success(self.authorized(request).send()?)?.json()?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.document)
            .map(|doc| from_firestore_fields(&doc.fields))
            .collect())
    }

    fn upload_asset(&self, path: &str, bytes: &[u8]) -> Result<String> {
        let bucket = self.bucket()?;
        let url = format!(
            "{}/b/{}/o",
            self.config.storage_base.trim_end_matches('/'),
            bucket
        );
        let request = self
            .client
            .post(url)
            .query(&[("uploadType", "media"), ("name", path)])
            .header(CONTENT_TYPE, mime_for_path(path))
            .body(bytes.to_vec());
        expect_success(self.authorized(request).send()?)?;

        info!("Uploaded {} to bucket {}", path, bucket);
        Ok(format!("{}?alt=media", self.storage_object_url(bucket, path)))
    }

    fn delete_asset(&self, reference: &str) -> Result<()> {
        let Some(bucket) = self.config.bucket.as_deref() else {
            return Ok(());
        };
        let Some(path) = self.object_path(bucket, reference) else {
            debug!("Skipping asset outside bucket {}: {}", bucket, reference);
            return Ok(());
        };

        let request = self.client.delete(self.storage_object_url(bucket, &path));
        let response = self.authorized(request).send()?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        expect_success(response)?;
        Ok(())
    }

    fn tracks_assets(&self) -> bool {
        self.config.bucket.is_some()
    }
}

fn structured_query(
    collection: Collection,
    field: &str,
    value: &Value,
    limit: Option<usize>,
) -> Value {
    let mut query = json!({
        "from": [{ "collectionId": collection.key() }],
        "where": {
            "fieldFilter": {
                "field": { "fieldPath": field },
                "op": "EQUAL",
                "value": to_firestore_value(value),
            }
        }
    });
    if let Some(n) = limit {
        query["limit"] = json!(n);
    }
    json!({ "structuredQuery": query })
}

/// Plain JSON → Firestore typed value.
pub fn to_firestore_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            // integerValue travels as a string
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(to_firestore_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": to_firestore_map(map) } }),
    }
}

fn to_firestore_map(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(k, v)| (k.clone(), to_firestore_value(v)))
        .collect()
}

fn to_firestore_fields(record: &Value) -> Map<String, Value> {
    match record {
        Value::Object(map) => to_firestore_map(map),
        _ => Map::new(),
    }
}

/// Firestore typed value → plain JSON. Unknown envelopes become null.
pub fn from_firestore_value(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|m| m.iter().next()) else {
        return Value::Null;
    };
    match kind.as_str() {
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "booleanValue" | "doubleValue" => inner.clone(),
        "integerValue" => match inner {
            Value::String(s) => s.parse::<i64>().map(Value::from).unwrap_or(Value::Null),
            other => other.clone(),
        },
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(from_firestore_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => inner
            .get("fields")
            .and_then(Value::as_object)
            .map(from_firestore_fields)
            .unwrap_or_else(|| Value::Object(Map::new())),
        _ => Value::Null,
    }
}

fn from_firestore_fields(fields: &Map<String, Value>) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), from_firestore_value(v)))
            .collect(),
    )
}

fn percent_decode(encoded: &str) -> String {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let decoded = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(b) = decoded {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn expect_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or(text);
    Err(RobopediaError::Remote {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(bucket: Option<&str>) -> FirestoreBackend {
        FirestoreBackend::new(FirestoreConfig {
            project_id: "robopedia-demo".into(),
            api_key: None,
            token: None,
            bucket: bucket.map(str::to_string),
            api_base: "https://firestore.googleapis.com/v1".into(),
            storage_base: "https://firebasestorage.googleapis.com/v0".into(),
        })
        .unwrap()
    }

    #[test]
    fn robot_document_survives_conversion() {
        let robot = json!({
            "id": "robot-001",
            "name": "Atlas",
            "year": 2013,
            "featured": true,
            "rating": 4.5,
            "mainImage": null,
            "tags": ["humanoid", "research"],
            "specifications": { "height": "1.5 m", "weight": "89 kg" },
            "gallery": []
        });

        let fields = to_firestore_fields(&robot);
        assert_eq!(fields["year"], json!({ "integerValue": "2013" }));
        assert_eq!(fields["name"], json!({ "stringValue": "Atlas" }));
        assert_eq!(from_firestore_fields(&fields), robot);
    }

    #[test]
    fn timestamps_come_back_as_strings() {
        let value = json!({ "timestampValue": "2024-03-01T10:00:00Z" });
        assert_eq!(from_firestore_value(&value), json!("2024-03-01T10:00:00Z"));
        assert_eq!(from_firestore_value(&json!({ "geoPointValue": {} })), Value::Null);
    }

    #[test]
    fn builds_equality_query_with_limit() {
        let query = structured_query(Collection::Robots, "slug", &json!("atlas"), Some(1));
        let sq = &query["structuredQuery"];
        assert_eq!(sq["from"][0]["collectionId"], "robots");
        assert_eq!(sq["where"]["fieldFilter"]["op"], "EQUAL");
        assert_eq!(
            sq["where"]["fieldFilter"]["value"],
            json!({ "stringValue": "atlas" })
        );
        assert_eq!(sq["limit"], 1);

        let unlimited = structured_query(Collection::News, "featured", &json!(true), None);
        assert!(unlimited["structuredQuery"].get("limit").is_none());
    }

    #[test]
    fn document_urls() {
        let fs = backend(None);
        assert_eq!(
            fs.documents_url(),
            "https://firestore.googleapis.com/v1/projects/robopedia-demo/databases/(default)/documents"
        );
        assert_eq!(
            fs.document_url("projects/p/databases/(default)/documents/robots/abc"),
            "https://firestore.googleapis.com/v1/projects/p/databases/(default)/documents/robots/abc"
        );
    }

    #[test]
    fn storage_urls_round_trip_to_object_path() {
        let fs = backend(Some("demo.appspot.com"));
        let url = format!(
            "{}?alt=media",
            fs.storage_object_url("demo.appspot.com", "images/17-atlas.png")
        );
        assert_eq!(
            url,
            "https://firebasestorage.googleapis.com/v0/b/demo.appspot.com/o/images%2F17-atlas.png?alt=media"
        );
        assert_eq!(
            fs.object_path("demo.appspot.com", &url),
            Some("images/17-atlas.png".to_string())
        );
        assert_eq!(fs.object_path("demo.appspot.com", "https://example.com/x.png"), None);
    }

    #[test]
    fn assets_need_a_bucket() {
        let fs = backend(None);
        assert!(!fs.tracks_assets());
        assert!(fs.upload_asset("images/1-a.png", b"x").is_err());
        assert!(fs.delete_asset("images/1-a.png").is_ok());
    }
}
