use crate::config::Source;
use crate::errors::FetchError;
use crate::models::{GvizResponse, RawRow, SourceData, StaticDocument, ValuesBatchResponse};
use reqwest::{Client, Response};
use std::time::Duration;
use tokio::fs;
use tracing::debug;

const GVIZ_OPEN: &str = "setResponse(";

#[derive(Debug, Clone)]
pub struct SheetFetcher {
    client: Client,
    source: Source,
}

impl SheetFetcher {
    pub fn new(source: Source, timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            source,
        })
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub async fn fetch(&self) -> Result<SourceData, FetchError> {
        match &self.source {
            Source::Gviz { url } => {
                let body = self.get_text(url).await?;
                Ok(SourceData::Sheet(parse_gviz(&body)?))
            }
            Source::Values {
                base_url,
                sheet_id,
                api_key,
                range,
            } => {
                let url = format!("{base_url}/v4/spreadsheets/{sheet_id}/values:batchGet");
                debug!("fetching {url} range {range}");
                let response = self
                    .client
                    .get(&url)
                    .query(&[("key", api_key.as_str()), ("ranges", range.as_str())])
                    .send()
                    .await?;
                let status = response.status();
                let body = response.text().await?;
                // The API reports bad keys and ranges in the body of a 4xx.
                match parse_values(&body) {
                    Err(err @ FetchError::Api { .. }) => Err(err),
                    _ if !status.is_success() => Err(FetchError::Status {
                        status: status.as_u16(),
                        url,
                    }),
                    Ok(rows) => Ok(SourceData::Labeled(rows)),
                    Err(err) => Err(err),
                }
            }
            Source::Static { location } => {
                let bytes = if is_remote(location) {
                    let response = checked(self.client.get(location).send().await?, location)?;
                    response.bytes().await?.to_vec()
                } else {
                    fs::read(location).await?
                };
                Ok(SourceData::Static(parse_static(&bytes)?))
            }
        }
    }

    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        debug!("fetching {url}");
        let response = checked(self.client.get(url).send().await?, url)?;
        Ok(response.text().await?)
    }
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

fn checked(response: Response, url: &str) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(FetchError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        })
    }
}

/// Removes the `google.visualization.Query.setResponse(...);` wrapper.
///
/// A body that is already bare JSON is passed through.
pub fn strip_gviz_envelope(body: &str) -> Result<&str, FetchError> {
    let trimmed = body.trim();
    if trimmed.starts_with('{') {
        return Ok(trimmed);
    }
    let start = trimmed
        .find(GVIZ_OPEN)
        .map(|i| i + GVIZ_OPEN.len())
        .ok_or_else(|| FetchError::Envelope("missing setResponse( prefix".to_string()))?;
    let end = trimmed
        .rfind(')')
        .filter(|&end| end >= start)
        .ok_or_else(|| FetchError::Envelope("missing closing parenthesis".to_string()))?;
    Ok(&trimmed[start..end])
}

pub fn parse_gviz(body: &str) -> Result<Vec<RawRow>, FetchError> {
    let json = strip_gviz_envelope(body)?;
    let response: GvizResponse = serde_json::from_str(json)?;

    if response.status.as_deref() == Some("error") {
        let message = response
            .errors
            .first()
            .and_then(|e| {
                e.detailed_message
                    .clone()
                    .or_else(|| e.message.clone())
                    .or_else(|| e.reason.clone())
            })
            .unwrap_or_else(|| "query failed".to_string());
        return Err(FetchError::Query(message));
    }

    let table = response
        .table
        .ok_or_else(|| FetchError::Envelope("response has no table".to_string()))?;

    Ok(table
        .rows
        .into_iter()
        .map(|row| RawRow::new(row.c.into_iter().map(|cell| cell.and_then(|c| c.v)).collect()))
        .collect())
}

pub fn parse_values(body: &str) -> Result<Vec<RawRow>, FetchError> {
    let response: ValuesBatchResponse = serde_json::from_str(body)?;

    if let Some(error) = response.error {
        return Err(FetchError::Api {
            code: error.code.unwrap_or_default(),
            message: error
                .message
                .or(error.status)
                .unwrap_or_else(|| "unknown error".to_string()),
        });
    }

    let values = response
        .value_ranges
        .into_iter()
        .next()
        .and_then(|range| range.values)
        .filter(|values| !values.is_empty())
        .ok_or(FetchError::NoData)?;

    Ok(values.into_iter().map(RawRow::from).collect())
}

pub fn parse_static(bytes: &[u8]) -> Result<StaticDocument, FetchError> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellValue;

    const GVIZ_BODY: &str = "/*O_o*/\ngoogle.visualization.Query.setResponse({\"version\":\"0.6\",\"status\":\"ok\",\"table\":{\"cols\":[],\"rows\":[{\"c\":[{\"v\":1.0},{\"v\":\"Sangli\"},null,{\"v\":null},{\"v\":true,\"f\":\"TRUE\"}]},{\"c\":[]}]}});";

    #[test]
    fn gviz_envelope_is_stripped() {
        let json = strip_gviz_envelope(GVIZ_BODY).unwrap();
        assert!(json.starts_with('{'));
        assert!(json.ends_with('}'));
        assert_eq!(strip_gviz_envelope(" {\"a\":1} ").unwrap(), "{\"a\":1}");
    }

    #[test]
    fn gviz_rows_keep_positions() {
        let rows = parse_gviz(GVIZ_BODY).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].cells,
            vec![
                Some(CellValue::Number(1.0)),
                Some(CellValue::Text("Sangli".to_string())),
                None,
                None,
                Some(CellValue::Bool(true)),
            ]
        );
        assert!(rows[1].cells.is_empty());
    }

    #[test]
    fn gviz_garbage_is_an_envelope_error() {
        assert!(matches!(parse_gviz("<html>nope</html>"), Err(FetchError::Envelope(_))));
        assert!(matches!(
            parse_gviz("google.visualization.Query.setResponse({not json});"),
            Err(FetchError::Json(_))
        ));
    }

    #[test]
    fn gviz_error_status_short_circuits() {
        let body = "google.visualization.Query.setResponse({\"status\":\"error\",\"errors\":[{\"reason\":\"access_denied\",\"message\":\"Access denied\"}]});";
        match parse_gviz(body) {
            Err(FetchError::Query(message)) => assert_eq!(message, "Access denied"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn values_error_field_short_circuits() {
        let body = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        match parse_values(body) {
            Err(FetchError::Api { code, message }) => {
                assert_eq!(code, 400);
                assert_eq!(message, "API key not valid.");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn values_without_rows_is_no_data() {
        assert!(matches!(parse_values(r#"{"valueRanges":[]}"#), Err(FetchError::NoData)));
        assert!(matches!(
            parse_values(r#"{"valueRanges":[{"range":"Sheet1!A1:Z1000"}]}"#),
            Err(FetchError::NoData)
        ));
        assert!(matches!(
            parse_values(r#"{"valueRanges":[{"range":"Sheet1","values":[]}]}"#),
            Err(FetchError::NoData)
        ));
        let rows = parse_values(r#"{"valueRanges":[{"range":"Sheet1","values":[["Warna","12"],["Chandoli"]]}]}"#).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].cells.len(), 1);
    }

    #[test]
    fn static_document_tolerates_missing_fields() {
        let doc = parse_static(br#"{"districts":[{"name":"Sangli","storage":12.5}],"talukas":[{}]}"#).unwrap();
        assert_eq!(doc.districts.len(), 1);
        assert_eq!(doc.districts[0].last_year, None);
        assert_eq!(doc.talukas[0].name, None);
        assert!(parse_static(b"\"charts\"").is_err());
    }
}
