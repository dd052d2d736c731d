use soap_params::report::{check_report_response, check_report_xml_error};
use soap_params::Error;

const XML_REPLY: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "<reportDownloadError><ApiError>",
    "<type>ReportDefinitionError.INVALID_FIELD_NAME_FOR_REPORT</type>",
    "<trigger>foo</trigger><fieldPath>bar</fieldPath>",
    "</ApiError></reportDownloadError>"
);

const VALID_REPORT: &str = concat!(
    "\"Custom ADGROUP_PERFORMANCE_REPORT (Oct 20, 2011-Oct 26, 2011)\"\n",
    "Campaign ID,Ad group ID,Impressions,Clicks,Cost\n",
    "Total, --,0,0,0.00"
);

/// `VALID_REPORT`, gzip-compressed
const GZIPPED_REPORT: &[u8] = &[
    0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x03, 0x53, 0x72, 0x2e, 0x2d, 0x2e, 0xc9,
    0xcf, 0x55, 0x70, 0x74, 0x71, 0x0f, 0xf2, 0x0f, 0x0d, 0x88, 0x0f, 0x70, 0x0d, 0x72, 0xf3, 0x0f,
    0xf2, 0x75, 0xf4, 0x73, 0x76, 0x8d, 0x0f, 0x72, 0x0d, 0xf0, 0x0f, 0x0a, 0x51, 0xd0, 0xf0, 0x4f,
    0x2e, 0x51, 0x30, 0x32, 0xd0, 0x01, 0x62, 0x43, 0x43, 0x5d, 0x30, 0xc7, 0x0c, 0xc2, 0xd1, 0x54,
    0xe2, 0x72, 0x4e, 0xcc, 0x2d, 0x48, 0xcc, 0x4c, 0xcf, 0x53, 0xf0, 0x74, 0xd1, 0x71, 0x4c, 0x51,
    0x48, 0x2f, 0xca, 0x2f, 0x2d, 0x00, 0xb1, 0x3d, 0x73, 0x0b, 0x8a, 0x52, 0x8b, 0x8b, 0x33, 0xf3,
    0xf3, 0x8a, 0x75, 0x9c, 0x73, 0x32, 0x93, 0xb3, 0x81, 0x54, 0x7e, 0x71, 0x09, 0x57, 0x48, 0x7e,
    0x49, 0x62, 0x8e, 0x8e, 0x82, 0xae, 0xae, 0x8e, 0x01, 0x08, 0xea, 0x19, 0x18, 0x00, 0x00, 0xa1,
    0x8b, 0x5b, 0xf8, 0x82, 0x00, 0x00, 0x00,
];

fn assert_xml_error(err: Error, expected_code: u16) {
    match err {
        Error::ReportXml { http_code, error_type, trigger, field_path } => {
            assert_eq!(http_code, expected_code);
            assert_eq!(error_type, "ReportDefinitionError.INVALID_FIELD_NAME_FOR_REPORT");
            assert_eq!(trigger, "foo");
            assert_eq!(field_path, "bar");
        }
        other => panic!("expected a report XML error, got {:?}", other),
    }
}

#[test]
fn test_check_for_errors_400() {
    let err = check_report_response(400, Some(XML_REPLY.as_bytes())).unwrap_err();
    assert_eq!(err.http_code(), Some(400));
    assert!(!err.to_string().is_empty());
    assert_xml_error(err, 400);
}

#[test]
fn test_check_for_errors_500() {
    let err = check_report_response(500, None).unwrap_err();
    assert!(matches!(err, Error::Report { http_code: 500, .. }));
    assert_eq!(err.http_code(), Some(500));
}

#[test]
fn test_check_for_errors_plain_body() {
    let err = check_report_response(502, Some(&b"Bad Gateway"[..])).unwrap_err();
    assert_eq!(err.to_string(), "HTTP code: 502, body: Bad Gateway");
}

#[test]
fn test_check_for_errors_200_success() {
    assert!(check_report_response(200, Some(VALID_REPORT.as_bytes())).is_ok());
}

#[test]
fn test_gzipped_data() {
    assert!(check_report_response(200, Some(GZIPPED_REPORT)).is_ok());
    assert!(check_report_xml_error(GZIPPED_REPORT, 200).is_ok());
}

#[test]
fn test_check_for_xml_error() {
    let err = check_report_xml_error(XML_REPLY.as_bytes(), 42).unwrap_err();
    assert_xml_error(err, 42);

    assert!(check_report_xml_error(VALID_REPORT.as_bytes(), 42).is_ok());
    assert!(check_report_xml_error(b"<other><ApiError/></other>", 42).is_ok());
}

#[test]
fn test_check_for_xml_error_with_message() {
    let message = check_report_xml_error(XML_REPLY.as_bytes(), 442).unwrap_err().to_string();
    for part in ["442", "ReportDefinitionError.INVALID_FIELD_NAME_FOR_REPORT", "foo", "bar"] {
        assert!(message.contains(part), "'{}' missing from '{}'", part, message);
    }
}
