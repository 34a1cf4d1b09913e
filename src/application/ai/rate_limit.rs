//! Sliding-count admission over the request log.

use time::{Duration, OffsetDateTime};

use crate::domain::entities::{AiContentRequest, RateLimits};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitExceeded {
    pub window: &'static str,
    pub limit: u32,
    pub retry_after_secs: u64,
}

/// Admit a new request for `user_id` when fewer than the configured number of
/// that user's requests were created in each of the last minute, hour, and day.
pub fn check_rate_limit(
    log: &[AiContentRequest],
    user_id: &str,
    limits: RateLimits,
    now: OffsetDateTime,
) -> Result<(), RateLimitExceeded> {
    let windows = [
        ("minute", Duration::minutes(1), limits.per_minute),
        ("hour", Duration::hours(1), limits.per_hour),
        ("day", Duration::days(1), limits.per_day),
    ];

    for (window, span, limit) in windows {
        let since = now - span;
        let recent: Vec<OffsetDateTime> = log
            .iter()
            .filter(|request| request.user_id == user_id && request.created_at > since)
            .map(|request| request.created_at)
            .collect();
        if recent.len() >= limit as usize {
            let oldest = recent.iter().min().copied().unwrap_or(now);
            let wait = (oldest + span - now).whole_seconds().max(1);
            return Err(RateLimitExceeded {
                window,
                limit,
                retry_after_secs: u64::try_from(wait).unwrap_or(1),
            });
        }
    }

    Ok(())
}

/// Providers bill roughly one token per four characters of English text.
pub fn estimate_tokens(text: &str) -> u32 {
    u32::try_from(text.chars().count().div_ceil(4)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::AiRequestMetadata;
    use crate::domain::types::{AiContentType, AiRequestStatus};
    use uuid::Uuid;

    fn request(user: &str, created_at: OffsetDateTime) -> AiContentRequest {
        AiContentRequest {
            id: Uuid::new_v4(),
            description: "decking copy".to_string(),
            content_type: AiContentType::ProductDescription,
            template_id: None,
            prompt: "Describe decking".to_string(),
            generated_content: None,
            status: AiRequestStatus::Completed,
            error: None,
            metadata: AiRequestMetadata::default(),
            user_id: user.to_string(),
            created_at,
            completed_at: None,
        }
    }

    const LIMITS: RateLimits = RateLimits {
        per_minute: 2,
        per_hour: 3,
        per_day: 10,
    };

    #[test]
    fn minute_window_rejects_third_request() {
        let now = OffsetDateTime::now_utc();
        let log = vec![
            request("ana", now - Duration::seconds(50)),
            request("ana", now - Duration::seconds(10)),
        ];
        let err = check_rate_limit(&log, "ana", LIMITS, now).unwrap_err();
        assert_eq!(err.window, "minute");
        assert_eq!(err.limit, 2);
        assert_eq!(err.retry_after_secs, 10);
    }

    #[test]
    fn windows_are_per_user_and_slide() {
        let now = OffsetDateTime::now_utc();
        let log = vec![
            request("ana", now - Duration::minutes(5)),
            request("ana", now - Duration::minutes(4)),
            request("ben", now - Duration::seconds(5)),
            request("ben", now - Duration::seconds(4)),
        ];
        assert!(check_rate_limit(&log, "ana", LIMITS, now).is_ok());

        let mut log = log;
        log.push(request("ana", now - Duration::minutes(3)));
        let err = check_rate_limit(&log, "ana", LIMITS, now).unwrap_err();
        assert_eq!(err.window, "hour");
    }

    #[test]
    fn estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("oak"), 1);
        assert_eq!(estimate_tokens("jarrah"), 2);
    }
}
