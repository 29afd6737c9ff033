//! CSV/xlsx conversion handler

use tracing::debug;

use crate::convert::convert;
use crate::error::HandlerError;
use crate::format::Format;

use super::{respond, Handler, Request, Response};

const UNSUPPORTED_CONTENT_TYPE: &str = "Unsupported Content-Type; must be text/csv or application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Converts the request body between CSV and xlsx based on its `Content-Type`
#[derive(Debug, Default, Clone, Copy)]
pub struct ConvertHandler;

impl ConvertHandler {
    pub fn new() -> Self {
        Self
    }

    fn process(&self, request: &Request) -> Result<Response, HandlerError> {
        // Direction is settled before the body is looked at
        let from = request
            .content_type()
            .and_then(Format::from_content_type)
            .ok_or_else(|| HandlerError::bad_request(UNSUPPORTED_CONTENT_TYPE))?;

        let payload = request.payload()?;
        debug!(from = %from, bytes = payload.len(), "converting payload");

        let converted = convert(&payload, from)?;
        Ok(Response::binary(&converted.bytes)
            .with_header("Content-Type", converted.format.mime_type())
            .with_header(
                "Content-Disposition",
                format!(
                    "attachment; filename=\"{}\"",
                    converted.format.output_filename()
                ),
            ))
    }
}

impl Handler for ConvertHandler {
    fn name(&self) -> &'static str {
        "convert"
    }

    fn handle(&self, request: &Request) -> Response {
        respond(self.name(), self.process(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{DelimitedCodec, SpreadsheetCodec, TableCodec, XLSX_MIME};
    use rust_xlsxwriter::Workbook;

    fn sample_xlsx() -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "a").unwrap();
        sheet.write_number(0, 1, 1).unwrap();
        sheet.write_string(1, 0, "b").unwrap();
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_csv_request() {
        let request = Request::new()
            .with_header("Content-Type", "text/csv")
            .with_body("name,age\nAda,30\nLin,41\n");
        let response = ConvertHandler.handle(&request);

        assert_eq!(response.status_code, 200);
        assert!(response.is_base64_encoded);
        assert_eq!(response.header("Content-Type"), Some(XLSX_MIME));
        assert_eq!(
            response.header("Content-Disposition"),
            Some("attachment; filename=\"output.xlsx\"")
        );

        let table = SpreadsheetCodec
            .decode(&response.decoded_body().unwrap())
            .unwrap();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.to_strings()[0], vec!["name", "age"]);
    }

    #[test]
    fn test_base64_csv_request() {
        let request = Request::new()
            .with_header("content-type", "text/csv; charset=utf-8")
            .with_binary_body(b"x,y\n1,2\n");
        let response = ConvertHandler.handle(&request);
        assert_eq!(response.status_code, 200);
    }

    #[test]
    fn test_xlsx_request() {
        let request = Request::new()
            .with_header("CONTENT-TYPE", XLSX_MIME)
            .with_binary_body(&sample_xlsx());
        let response = ConvertHandler.handle(&request);

        assert_eq!(response.status_code, 200);
        assert_eq!(response.header("Content-Type"), Some("text/csv"));
        assert_eq!(
            response.header("Content-Disposition"),
            Some("attachment; filename=\"output.csv\"")
        );
        assert_eq!(response.decoded_body().unwrap(), b"a,1\nb,\n");
    }

    #[test]
    fn test_unsupported_content_type_skips_body() {
        // The body is invalid base64, so a 400 about the content type shows
        // the body was never decoded
        let mut request = Request::new()
            .with_header("Content-Type", "application/json")
            .with_body("%%%");
        request.is_base64_encoded = true;

        let response = ConvertHandler.handle(&request);
        assert_eq!(response.status_code, 400);
        assert_eq!(
            response.error_message().as_deref(),
            Some(UNSUPPORTED_CONTENT_TYPE)
        );
    }

    #[test]
    fn test_missing_content_type() {
        let response = ConvertHandler.handle(&Request::new().with_body("a,b\n"));
        assert_eq!(response.status_code, 400);
    }

    #[test]
    fn test_invalid_base64() {
        let mut request = Request::new()
            .with_header("Content-Type", "text/csv")
            .with_body("not*base64");
        request.is_base64_encoded = true;

        let response = ConvertHandler.handle(&request);
        assert_eq!(response.status_code, 400);
        assert_eq!(
            response.error_message().as_deref(),
            Some("Invalid base64 payload")
        );
    }

    #[test]
    fn test_processing_errors_are_500() {
        let request = Request::new()
            .with_header("Content-Type", "text/csv")
            .with_body("a,\"open\n");
        let response = ConvertHandler.handle(&request);
        assert_eq!(response.status_code, 500);
        assert_eq!(
            response.error_message().as_deref(),
            Some("unterminated quoted field starting on line 1")
        );

        let request = Request::new()
            .with_header("Content-Type", XLSX_MIME)
            .with_binary_body(b"PK\x03\x04 truncated");
        let response = ConvertHandler.handle(&request);
        assert_eq!(response.status_code, 500);
        assert!(!response.is_base64_encoded);
    }

    #[test]
    fn test_round_trip_through_handler() {
        let csv = "k,v\nk1,\"a, b\nc\"\n";
        let to_xlsx = ConvertHandler.handle(
            &Request::new()
                .with_header("Content-Type", "text/csv")
                .with_body(csv),
        );
        let back = ConvertHandler.handle(
            &Request::new()
                .with_header("Content-Type", XLSX_MIME)
                .with_binary_body(&to_xlsx.decoded_body().unwrap()),
        );
        let table = DelimitedCodec
            .decode(&back.decoded_body().unwrap())
            .unwrap();
        assert_eq!(table.to_strings()[1], vec!["k1", "a, b\nc"]);
    }
}
