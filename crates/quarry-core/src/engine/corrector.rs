//! Pluggable query correction.

use anyhow::bail;
use serde::Serialize;

/// Everything a corrector is told about a failed attempt.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CorrectionRequest<'a> {
    /// The step's query text that failed, with dependencies referenced by
    /// step id
    pub query: &'a str,
    /// The exact text submitted to the store, with dependency relations
    /// inlined
    pub resolved_query: &'a str,
    /// Verbatim error message from the store
    pub error: &'a str,
    /// The step's description
    pub description: &'a str,
    /// Correction number for this step, starting at 1
    pub attempt: u32,
}

/// Proposes a revised query for a step that failed with a retryable error.
///
/// The revised text replaces the step's own query, so it should keep
/// referring to upstream steps by id; the engine inlines their results again
/// before re-running it.
pub trait Corrector {
    fn fix(&self, request: &CorrectionRequest<'_>) -> anyhow::Result<String>;
}

impl<F> Corrector for F
where
    F: Fn(&CorrectionRequest<'_>) -> anyhow::Result<String>,
{
    fn fix(&self, request: &CorrectionRequest<'_>) -> anyhow::Result<String> {
        self(request)
    }
}

/// Placeholder used when an engine has no corrector; never invoked.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCorrector;

impl Corrector for NoCorrector {
    fn fix(&self, _request: &CorrectionRequest<'_>) -> anyhow::Result<String> {
        bail!("no corrector configured")
    }
}

/// Strips markdown code fences and surrounding whitespace from corrector
/// output. Returns `None` when nothing usable is left.
pub(crate) fn clean_query(raw: &str) -> Option<String> {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // Drop an optional language tag on the fence line.
        text = rest.split_once('\n').map_or("", |(_, body)| body);
        text = text.trim_end();
        text = text.strip_suffix("```").unwrap_or(text);
    }
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_plain_query() {
        assert_eq!(clean_query("  SELECT 1  \n"), Some("SELECT 1".to_string()));
    }

    #[test]
    fn test_clean_fenced_query() {
        let raw = "```sql\nSELECT total\nFROM q1\n```\n";
        assert_eq!(clean_query(raw), Some("SELECT total\nFROM q1".to_string()));
        assert_eq!(clean_query("```\nSELECT 2\n```"), Some("SELECT 2".to_string()));
    }

    #[test]
    fn test_clean_rejects_empty() {
        assert_eq!(clean_query("   "), None);
        assert_eq!(clean_query("```sql\n```"), None);
        assert_eq!(clean_query("```"), None);
    }

    #[test]
    fn test_closure_corrector() {
        let corrector = |request: &CorrectionRequest<'_>| -> anyhow::Result<String> {
            Ok(format!("{} -- {}", request.query, request.attempt))
        };
        let request = CorrectionRequest {
            query: "SELECT 1",
            resolved_query: "SELECT 1",
            error: "boom",
            description: "",
            attempt: 2,
        };
        assert_eq!(corrector.fix(&request).unwrap(), "SELECT 1 -- 2");
        assert!(NoCorrector.fix(&request).is_err());
    }
}
