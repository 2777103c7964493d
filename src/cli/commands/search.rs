//! One-shot lookup command.

use std::io::Write;

use serde::Serialize;

use crate::config::Settings;
use crate::services::LookupService;

/// Look up `keyword` and print the same JSON the API returns.
pub async fn cmd_search(settings: &Settings, keyword: &str, pretty: bool) -> anyhow::Result<()> {
    let lookup = settings.create_lookup_service()?;
    print_search(
        &lookup,
        keyword,
        pretty,
        &mut std::io::stdout(),
        &mut std::io::stderr(),
    )
    .await
}

/// Write the response to `out`, or the error body to `err` and fail.
async fn print_search(
    lookup: &LookupService,
    keyword: &str,
    pretty: bool,
    out: &mut impl Write,
    err: &mut impl Write,
) -> anyhow::Result<()> {
    match lookup.search(keyword).await {
        Ok(response) => {
            writeln!(out, "{}", to_json(&response, pretty)?)?;
            Ok(())
        }
        Err(e) => {
            writeln!(err, "{}", to_json(&e.body(), pretty)?)?;
            Err(anyhow::anyhow!("Lookup for {:?} failed: {}", keyword, e))
        }
    }
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::models::MatchMode;
    use crate::sheets::InMemoryRowSource;

    fn lookup_with(source: InMemoryRowSource) -> LookupService {
        LookupService::new(Arc::new(source), "Sheet1!A:Z", MatchMode::NameOrPhone)
    }

    fn sample() -> InMemoryRowSource {
        InMemoryRowSource::new(vec![
            vec!["Name", "Phone", "Sender", "Tickets", "Number", "NeedPay", "Amount", "PickedUp", "Counter"],
            vec!["Alice", "0912345678", "Bob", "2", "A1", "FALSE", "0", "FALSE", "Counter1"],
        ])
    }

    async fn capture(
        lookup: &LookupService,
        keyword: &str,
        pretty: bool,
    ) -> (anyhow::Result<()>, String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = print_search(lookup, keyword, pretty, &mut out, &mut err).await;
        (
            result,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_search_prints_results() {
        let (result, out, err) = capture(&lookup_with(sample()), "Alice", false).await;
        assert!(result.is_ok());
        assert!(err.is_empty());
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["results"][0]["number"], "A1");
        assert_eq!(out.trim_end().lines().count(), 1);
    }

    #[tokio::test]
    async fn test_search_pretty_output() {
        let (result, out, _) = capture(&lookup_with(sample()), "Alice", true).await;
        assert!(result.is_ok());
        assert!(out.trim_end().lines().count() > 1);
    }

    #[tokio::test]
    async fn test_search_not_found_returns_error() {
        let (result, out, err) = capture(&lookup_with(sample()), "Mallory", false).await;
        assert!(result.is_err());
        assert!(out.is_empty());
        let json: serde_json::Value = serde_json::from_str(&err).unwrap();
        assert!(json["error"].as_str().unwrap().starts_with("No matching tickets"));
    }

    #[tokio::test]
    async fn test_search_upstream_failure_returns_error() {
        let lookup = lookup_with(InMemoryRowSource::failing("quota exceeded"));
        let (result, _, err) = capture(&lookup, "Alice", false).await;

        let message = result.unwrap_err().to_string();
        assert!(message.contains("Alice"));
        let json: serde_json::Value = serde_json::from_str(&err).unwrap();
        assert!(json["detail"].as_str().unwrap().contains("quota exceeded"));
    }
}
