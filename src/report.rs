// Report definitions and downloads
//
// Report downloads take a report definition as a nested mapping. The
// server expects its elements in schema order, so the definition is
// walked against a fixed order table before it is rendered. Every
// unknown key in the tree is collected and reported in one error.
// Download responses are classified by status and error body.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::internal::error::{Error, Result};
use crate::schema::shaped::{ShapedField, ShapedObject, ShapedValue};
use crate::schema::utils::{child_path, describe_json, index_path};

/// Name of the top-level section in the order table
const ROOT_SECTION: &str = "root";

/// Element order of every mapping-valued section of a report definition
const REPORT_DEFINITION_ORDER: &[(&str, &[&str])] = &[
    (
        ROOT_SECTION,
        &[
            "selector",
            "report_name",
            "report_type",
            "date_range_type",
            "download_format",
            "include_zero_impressions",
        ],
    ),
    ("selector", &["fields", "predicates", "date_range", "ordering", "paging"]),
    ("predicates", &["field", "operator", "values"]),
    ("ordering", &["field", "sort_order"]),
    ("paging", &["start_index", "number_results"]),
    ("date_range", &["min", "max"]),
];

fn section_order(section: &str) -> Option<&'static [&'static str]> {
    REPORT_DEFINITION_ORDER
        .iter()
        .find(|(name, _)| *name == section)
        .map(|(_, order)| *order)
}

/// Orders a report definition, rejecting fields the report schema lacks.
///
/// Sections may be a mapping or a sequence of mappings (`predicates` is
/// commonly given either way).
pub fn order_report_definition(definition: &Value) -> Result<ShapedObject> {
    let map = match definition {
        Value::Object(map) => map,
        other => {
            return Err(Error::InvalidReportDefinition(format!(
                "Report definition must be a mapping, got {}",
                describe_json(other)
            )));
        }
    };

    let mut unknown = Vec::new();
    let ordered = order_section(ROOT_SECTION, map, "", &mut unknown)?;
    if !unknown.is_empty() {
        return Err(Error::InvalidReportDefinition(format!(
            "Unknown report definition field(s): [{}]",
            unknown.join(", ")
        )));
    }
    Ok(ordered)
}

fn order_section(
    section: &str,
    map: &Map<String, Value>,
    path: &str,
    unknown: &mut Vec<String>,
) -> Result<ShapedObject> {
    // Callers only pass sections that exist in the table
    let order = section_order(section).unwrap_or(&[]);

    for key in map.keys() {
        if !order.contains(&key.as_str()) {
            unknown.push(key.clone());
        }
    }

    let mut object = ShapedObject::new(section);
    for name in order {
        let field_path = child_path(path, name);
        match map.get(*name) {
            None | Some(Value::Null) => {},
            Some(value) => {
                let shaped = order_value(name, value, &field_path, unknown)?;
                object.fields.push(ShapedField::new(name, shaped));
            }
        }
    }
    Ok(object)
}

fn order_value(name: &str, value: &Value, path: &str, unknown: &mut Vec<String>) -> Result<ShapedValue> {
    match value {
        Value::Object(map) if section_order(name).is_some() => {
            Ok(ShapedValue::Object(order_section(name, map, path, unknown)?))
        },
        Value::Array(items) => {
            let mut shaped = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                shaped.push(order_value(name, item, &index_path(path, index), unknown)?);
            }
            Ok(ShapedValue::List(shaped))
        },
        Value::String(s) => Ok(ShapedValue::String(s.clone())),
        Value::Bool(b) => Ok(ShapedValue::Boolean(*b)),
        Value::Number(n) => Ok(match n.as_i64() {
            Some(i) => ShapedValue::Int(i),
            None => ShapedValue::Double(n.as_f64().unwrap_or_default()),
        }),
        other => Err(Error::mismatch(
            path,
            format!("'{}' expects a scalar value, got {}", name, describe_json(other)),
        )),
    }
}

/// Report download switches that map to HTTP request headers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReportDownloadOptions {
    pub skip_report_header: bool,
    pub skip_column_header: bool,
    pub skip_report_summary: bool,
    pub include_zero_impressions: bool,
    pub use_raw_enum_values: bool,
}

impl ReportDownloadOptions {
    /// Headers to send with a report download; only enabled switches
    /// produce a header
    pub fn headers(&self) -> Vec<(&'static str, &'static str)> {
        [
            ("skipReportHeader", self.skip_report_header),
            ("skipColumnHeader", self.skip_column_header),
            ("skipReportSummary", self.skip_report_summary),
            ("includeZeroImpressions", self.include_zero_impressions),
            ("useRawEnumValues", self.use_raw_enum_values),
        ]
        .into_iter()
        .filter(|(_, enabled)| *enabled)
        .map(|(header, _)| (header, "true"))
        .collect()
    }
}

/// Status of a successful report download
const HTTP_OK: u16 = 200;

/// Classifies a report download response.
///
/// Anything but 200 is an error: a `reportDownloadError` XML body becomes
/// `ReportXml` with the API error's details, any other body becomes
/// `Report`. Successful bodies are not inspected, so gzipped reports pass
/// as they are.
pub fn check_report_response(http_code: u16, body: Option<&[u8]>) -> Result<()> {
    if http_code == HTTP_OK {
        return Ok(());
    }

    let body = body.unwrap_or_default();
    check_report_xml_error(body, http_code)?;
    Err(Error::Report {
        http_code,
        body: String::from_utf8_lossy(body).into_owned(),
    })
}

/// Fails with `ReportXml` if the body is a `reportDownloadError` document.
/// Bodies that are not XML, or are XML of another shape, pass.
pub fn check_report_xml_error(body: &[u8], http_code: u16) -> Result<()> {
    let Ok(text) = std::str::from_utf8(body) else {
        return Ok(());
    };
    let Ok(document) = roxmltree::Document::parse(text) else {
        return Ok(());
    };

    let root = document.root_element();
    if !root.has_tag_name("reportDownloadError") {
        return Ok(());
    }
    let Some(api_error) = root.children().find(|node| node.has_tag_name("ApiError")) else {
        return Ok(());
    };

    let detail = |name: &str| {
        api_error
            .children()
            .find(|node| node.has_tag_name(name))
            .and_then(|node| node.text())
            .unwrap_or_default()
            .to_string()
    };
    let error = Error::ReportXml {
        http_code,
        error_type: detail("type"),
        trigger: detail("trigger"),
        field_path: detail("fieldPath"),
    };
    debug!(http_code, error = %error, "report download failed");
    Err(error)
}
