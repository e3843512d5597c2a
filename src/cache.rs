/// Server file-cache administration — status report and clear confirmation.
///
/// Both calls are stateless; this module only turns their replies into the
/// text shown in dialogs. The confirmation prompt must be accepted before
/// `/api/cache/clear` is ever sent.
use tracing::debug;

use crate::client::{CacheClearReply, CacheStatus, ClientError};

pub const CLEAR_CONFIRM_PROMPT: &str =
    "Are you sure you want to clear the file cache? This will require re-downloading files.";

/// Dialog text for a status reply, or `Err` with the reason when the server
/// reported a failure (callers log it instead of showing a dialog).
pub fn status_report(status: &CacheStatus) -> Result<String, String> {
    if !status.success {
        return Err(status
            .error
            .clone()
            .unwrap_or_else(|| "unknown error".to_string()));
    }
    debug!(count = status.cached_files.len(), files = ?status.cached_files, "cached files");
    Ok(format!(
        "Cache Status:\nFiles cached: {}/{}\nUsage: {}%",
        status.cache_size,
        status.cache_max,
        fmt_percent(status.cache_usage_percent),
    ))
}

/// Alert text for the outcome of a clear request.
pub fn clear_report(result: &Result<CacheClearReply, ClientError>) -> String {
    match result {
        Ok(reply) if reply.success => "✅ File cache cleared successfully!".to_string(),
        Ok(reply) => format!(
            "❌ Error clearing cache: {}",
            reply.error.as_deref().unwrap_or("unknown error")
        ),
        Err(_) => "❌ Error clearing cache".to_string(),
    }
}

/// Percent as the server rounds it (two decimals), without trailing zeros.
fn fmt_percent(p: f64) -> String {
    let s = format!("{:.2}", p);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_report() {
        let status = CacheStatus {
            success: true,
            cache_size: 3,
            cache_max: 50,
            cache_usage_percent: 6.0,
            ..Default::default()
        };
        assert_eq!(
            status_report(&status).unwrap(),
            "Cache Status:\nFiles cached: 3/50\nUsage: 6%"
        );
    }

    #[test]
    fn test_status_report_fractional_usage() {
        let status = CacheStatus {
            success: true,
            cache_size: 7,
            cache_max: 30,
            cache_usage_percent: 23.33,
            ..Default::default()
        };
        assert!(status_report(&status).unwrap().ends_with("Usage: 23.33%"));
    }

    #[test]
    fn test_status_report_from_server_reply() {
        let status: CacheStatus = serde_json::from_str(
            r#"{"success": true, "cache_size": 2, "cache_max": 50,
                "cache_usage_percent": 4.0, "cached_files": ["f1_a.pdf", "f2_b.csv"]}"#,
        )
        .unwrap();
        assert_eq!(status.cached_files, vec!["f1_a.pdf", "f2_b.csv"]);
        assert_eq!(
            status_report(&status).unwrap(),
            "Cache Status:\nFiles cached: 2/50\nUsage: 4%"
        );
    }

    #[test]
    fn test_clear_reply_with_server_message() {
        let reply: CacheClearReply =
            serde_json::from_str(r#"{"success": true, "message": "Cache cleared"}"#).unwrap();
        assert_eq!(clear_report(&Ok(reply)), "✅ File cache cleared successfully!");
    }

    #[test]
    fn test_status_report_failure() {
        let status = CacheStatus {
            error: Some("Not authenticated".to_string()),
            ..Default::default()
        };
        assert_eq!(status_report(&status).unwrap_err(), "Not authenticated");
    }

    #[test]
    fn test_clear_report() {
        let ok = Ok(CacheClearReply { success: true, ..Default::default() });
        assert_eq!(clear_report(&ok), "✅ File cache cleared successfully!");

        let app_err = Ok(CacheClearReply {
            success: false,
            error: Some("Not authenticated".to_string()),
            ..Default::default()
        });
        assert_eq!(clear_report(&app_err), "❌ Error clearing cache: Not authenticated");

        let transport = Err(ClientError::Decode("eof".to_string()));
        assert_eq!(clear_report(&transport), "❌ Error clearing cache");
    }
}
