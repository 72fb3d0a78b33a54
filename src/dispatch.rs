//! Multi-endpoint notification dispatch.
//!
//! Backends differ in which notification routes they actually implement,
//! so each notification intent maps to an ordered list of candidate
//! endpoint+payload pairs that all mean the same thing. The dispatcher
//! probes them strictly in priority order - the candidates are alternative
//! implementations of one logical route, and probing in parallel could
//! double-send an email - and folds the attempts into one
//! [`DispatchOutcome`].
//!
//! Validation failures and exhausted fallbacks come back as structured
//! outcomes, never as errors; callers display them, they don't unwind.

use serde_json::{json, Value};

use crate::client::HttpClient;

/// Tuning knobs for the broadcast-to-all intent.
///
/// Every field has a server-compatible default; the CLI only sets what the
/// user asked for.
#[derive(Debug, Clone, Default)]
pub struct BroadcastOptions {
    /// Email subject line.
    pub subject: Option<String>,
    /// Email body message.
    pub message: Option<String>,
    /// Whether to include the upcoming-quiz digest (defaults to true).
    pub include_quizzes: Option<bool>,
    /// How many days of upcoming quizzes to include (defaults to 30).
    pub days_ahead: Option<u32>,
    /// Quiz to feature prominently in the email, if any.
    pub highlight_quiz_id: Option<i64>,
}

/// What the caller wants users to be told about.
///
/// Identifiers are optional because the calling form may not have one yet;
/// a missing required id fails validation before any network traffic.
#[derive(Debug, Clone)]
pub enum NotificationIntent {
    /// A new quiz was created.
    NewQuiz {
        /// Id of the new quiz.
        quiz_id: Option<i64>,
    },
    /// A new subject was created.
    NewSubject {
        /// Id of the new subject.
        subject_id: Option<i64>,
        /// Display name of the subject.
        subject_name: String,
    },
    /// A new chapter was created.
    NewChapter {
        /// Id of the new chapter.
        chapter_id: Option<i64>,
        /// Display name of the chapter.
        chapter_name: String,
        /// Id of the parent subject, when known.
        subject_id: Option<i64>,
    },
    /// Tell every active user about available quizzes.
    BroadcastAll(BroadcastOptions),
}

/// One alternative server route believed to implement the intent.
#[derive(Debug, Clone)]
pub struct EndpointCandidate {
    /// Request path.
    pub url: String,
    /// JSON body this route expects, if any.
    pub payload: Option<Value>,
}

impl NotificationIntent {
    /// Short label for logs.
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            Self::NewQuiz { .. } => "new quiz",
            Self::NewSubject { .. } => "new subject",
            Self::NewChapter { .. } => "new chapter",
            Self::BroadcastAll(_) => "broadcast",
        }
    }

    /// Validation error for a missing required identifier, if any.
    fn missing_id_error(&self) -> Option<String> {
        match self {
            Self::NewQuiz { quiz_id: None } => {
                Some("Cannot send quiz notification: no quiz id provided".to_string())
            }
            Self::NewSubject {
                subject_id: None, ..
            } => Some("Cannot send subject notification: no subject id provided".to_string()),
            Self::NewChapter {
                chapter_id: None, ..
            } => Some("Cannot send chapter notification: no chapter id provided".to_string()),
            _ => None,
        }
    }

    /// The fixed priority list of candidate routes for this intent.
    ///
    /// Order matters: the admin-scoped route comes first, generic
    /// fallbacks after. Callers must have validated the required ids.
    #[must_use]
    pub fn candidates(&self) -> Vec<EndpointCandidate> {
        match self {
            Self::NewQuiz { quiz_id } => {
                let quiz_id = quiz_id.unwrap_or_default();
                vec![
                    // Dedicated route takes the id in the path, no body
                    EndpointCandidate {
                        url: format!("/api/admin/notify-quiz/{}", quiz_id),
                        payload: None,
                    },
                    EndpointCandidate {
                        url: "/api/notifications/send-all".to_string(),
                        payload: Some(json!({
                            "subject": "New Quiz Available",
                            "message": "A new quiz has been added to the system. Login to take it!",
                            "include_quizzes": true,
                            "days_ahead": 30,
                            "highlight_quiz_id": quiz_id,
                        })),
                    },
                ]
            }
            Self::NewSubject {
                subject_id,
                subject_name,
            } => {
                let payload = json!({
                    "subjectId": subject_id,
                    "subjectName": subject_name,
                    "autoTriggered": true,
                });
                [
                    "/api/admin/notify-subject",
                    "/api/notify/subject",
                    "/api/subjects/notify",
                ]
                .iter()
                .map(|url| EndpointCandidate {
                    url: (*url).to_string(),
                    payload: Some(payload.clone()),
                })
                .collect()
            }
            Self::NewChapter {
                chapter_id,
                chapter_name,
                subject_id,
            } => {
                let payload = json!({
                    "chapterId": chapter_id,
                    "chapterName": chapter_name,
                    "subjectId": subject_id,
                    "autoTriggered": true,
                });
                [
                    "/api/admin/notify-chapter",
                    "/api/notify/chapter",
                    "/api/chapters/notify",
                ]
                .iter()
                .map(|url| EndpointCandidate {
                    url: (*url).to_string(),
                    payload: Some(payload.clone()),
                })
                .collect()
            }
            Self::BroadcastAll(options) => {
                let payload = json!({
                    "type": "quizzes",
                    "adminTriggered": true,
                    "subject": options
                        .subject
                        .as_deref()
                        .unwrap_or("New Quizzes Available"),
                    "message": options
                        .message
                        .as_deref()
                        .unwrap_or("There are new quizzes available for you to attempt!"),
                    "include_quizzes": options.include_quizzes.unwrap_or(true),
                    "days_ahead": options.days_ahead.unwrap_or(30),
                    "highlight_quiz_id": options.highlight_quiz_id,
                });
                [
                    "/api/admin/notify-all-quizzes",
                    "/api/admin/notify-all",
                    "/api/notifications/send-all",
                ]
                .iter()
                .map(|url| EndpointCandidate {
                    url: (*url).to_string(),
                    payload: Some(payload.clone()),
                })
                .collect()
            }
        }
    }
}

/// One entry in the attempt log.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// Route that was tried.
    pub url: String,
    /// Failure summary, or `None` for the succeeding attempt.
    pub error: Option<String>,
}

/// Normalized result of dispatching one notification intent.
///
/// Constructed fresh per call and never mutated after return. The attempt
/// log preserves every failed candidate in the order tried, plus a final
/// record for the succeeding one.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// Whether any candidate accepted the notification.
    pub succeeded: bool,
    /// Response data from the accepting candidate.
    pub data: Option<Value>,
    /// Every attempt, in priority order.
    pub attempts: Vec<AttemptRecord>,
    /// Why nothing was sent: validation failure or exhausted fallbacks.
    pub error: Option<String>,
}

impl DispatchOutcome {
    fn rejected(error: String) -> Self {
        Self {
            succeeded: false,
            data: None,
            attempts: Vec::new(),
            error: Some(error),
        }
    }

    fn delivered(data: Value, attempts: Vec<AttemptRecord>) -> Self {
        Self {
            succeeded: true,
            data: Some(data),
            attempts,
            error: None,
        }
    }

    fn exhausted(attempts: Vec<AttemptRecord>) -> Self {
        let error = format!("All {} notification endpoints failed", attempts.len());
        Self {
            succeeded: false,
            data: None,
            attempts,
            error: Some(error),
        }
    }
}

/// Probes candidate notification routes until one accepts.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    client: HttpClient,
}

impl NotificationDispatcher {
    /// Creates a dispatcher over an API client.
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Checks whether the notification system is reachable at all.
    ///
    /// The status route itself may not exist on a given backend; any
    /// failure reads as "not available" rather than an error.
    pub async fn check_notification_system(&self) -> bool {
        match self.client.get("/api/notification-status").await {
            Ok(data) => data
                .get("available")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            Err(e) => {
                log::warn!("Notification system may not be available: {}", e);
                false
            }
        }
    }

    /// Dispatches one intent through its candidate routes.
    ///
    /// Candidates are tried strictly one after another - never
    /// concurrently - and the loop stops at the first acceptance. Transport
    /// failures and non-2xx responses both count as "this candidate
    /// failed"; the distinction survives only in the logged summary.
    pub async fn notify(&self, intent: NotificationIntent) -> DispatchOutcome {
        if let Some(error) = intent.missing_id_error() {
            log::error!("{}", error);
            return DispatchOutcome::rejected(error);
        }

        let is_broadcast = matches!(intent, NotificationIntent::BroadcastAll(_));
        let label = intent.describe();
        let candidates = intent.candidates();
        let total = candidates.len();
        let mut attempts = Vec::with_capacity(total);

        for candidate in candidates {
            match self.client.post(&candidate.url, candidate.payload).await {
                Ok(data) => {
                    log::info!("Sent {} notification via {}", label, candidate.url);
                    attempts.push(AttemptRecord {
                        url: candidate.url,
                        error: None,
                    });
                    let data = if is_broadcast {
                        normalize_broadcast(&data)
                    } else {
                        data
                    };
                    return DispatchOutcome::delivered(data, attempts);
                }
                Err(e) => {
                    log::warn!(
                        "Failed to send {} notification via {}: {}",
                        label,
                        candidate.url,
                        e
                    );
                    attempts.push(AttemptRecord {
                        url: candidate.url,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        log::error!("All {} {} notification attempts failed", total, label);
        DispatchOutcome::exhausted(attempts)
    }

    /// Notifies users about a newly created quiz.
    pub async fn notify_new_quiz(&self, quiz_id: Option<i64>) -> DispatchOutcome {
        self.notify(NotificationIntent::NewQuiz { quiz_id }).await
    }

    /// Notifies users about a newly created subject.
    pub async fn notify_new_subject(
        &self,
        subject_id: Option<i64>,
        subject_name: &str,
    ) -> DispatchOutcome {
        self.notify(NotificationIntent::NewSubject {
            subject_id,
            subject_name: subject_name.to_string(),
        })
        .await
    }

    /// Notifies users about a newly created chapter.
    pub async fn notify_new_chapter(
        &self,
        chapter_id: Option<i64>,
        chapter_name: &str,
        subject_id: Option<i64>,
    ) -> DispatchOutcome {
        self.notify(NotificationIntent::NewChapter {
            chapter_id,
            chapter_name: chapter_name.to_string(),
            subject_id,
        })
        .await
    }

    /// Notifies every active user about available quizzes.
    pub async fn notify_all_users(&self, options: BroadcastOptions) -> DispatchOutcome {
        self.notify(NotificationIntent::BroadcastAll(options)).await
    }
}

/// Folds a broadcast response into `{sentCount, message}`.
///
/// Servers that report a recipient count expose it as `users_notified`;
/// ones that don't get the `"all"` sentinel.
fn normalize_broadcast(data: &Value) -> Value {
    let sent_count = data
        .get("users_notified")
        .cloned()
        .unwrap_or_else(|| Value::String("all".to_string()));
    let message = data
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Notifications sent successfully");
    json!({
        "sentCount": sent_count,
        "message": message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiz_candidates_in_priority_order() {
        let intent = NotificationIntent::NewQuiz { quiz_id: Some(42) };
        let candidates = intent.candidates();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].url, "/api/admin/notify-quiz/42");
        assert!(candidates[0].payload.is_none());
        assert_eq!(candidates[1].url, "/api/notifications/send-all");

        let fallback = candidates[1].payload.as_ref().expect("fallback payload");
        assert_eq!(fallback["highlight_quiz_id"], 42);
        assert_eq!(fallback["include_quizzes"], true);
        assert_eq!(fallback["days_ahead"], 30);
    }

    #[test]
    fn test_subject_candidates_in_priority_order() {
        let intent = NotificationIntent::NewSubject {
            subject_id: Some(3),
            subject_name: "Physics".to_string(),
        };
        let urls: Vec<String> = intent.candidates().into_iter().map(|c| c.url).collect();
        assert_eq!(
            urls,
            vec![
                "/api/admin/notify-subject",
                "/api/notify/subject",
                "/api/subjects/notify",
            ]
        );
    }

    #[test]
    fn test_subject_payload_shape() {
        let intent = NotificationIntent::NewSubject {
            subject_id: Some(3),
            subject_name: "Physics".to_string(),
        };
        let candidates = intent.candidates();
        let payload = candidates[0].payload.as_ref().expect("payload");
        assert_eq!(payload["subjectId"], 3);
        assert_eq!(payload["subjectName"], "Physics");
        assert_eq!(payload["autoTriggered"], true);
    }

    #[test]
    fn test_chapter_candidates_in_priority_order() {
        let intent = NotificationIntent::NewChapter {
            chapter_id: Some(9),
            chapter_name: "Optics".to_string(),
            subject_id: Some(3),
        };
        let urls: Vec<String> = intent.candidates().into_iter().map(|c| c.url).collect();
        assert_eq!(
            urls,
            vec![
                "/api/admin/notify-chapter",
                "/api/notify/chapter",
                "/api/chapters/notify",
            ]
        );
    }

    #[test]
    fn test_broadcast_candidates_share_payload() {
        let intent = NotificationIntent::BroadcastAll(BroadcastOptions::default());
        let candidates = intent.candidates();

        let urls: Vec<&str> = candidates.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "/api/admin/notify-all-quizzes",
                "/api/admin/notify-all",
                "/api/notifications/send-all",
            ]
        );

        for candidate in &candidates {
            let payload = candidate.payload.as_ref().expect("payload");
            assert_eq!(payload["type"], "quizzes");
            assert_eq!(payload["adminTriggered"], true);
            assert_eq!(payload["include_quizzes"], true);
            assert_eq!(payload["days_ahead"], 30);
            assert_eq!(payload["subject"], "New Quizzes Available");
        }
    }

    #[test]
    fn test_broadcast_options_override_defaults() {
        let intent = NotificationIntent::BroadcastAll(BroadcastOptions {
            subject: Some("Weekly digest".to_string()),
            message: None,
            include_quizzes: Some(false),
            days_ahead: Some(7),
            highlight_quiz_id: Some(5),
        });
        let candidates = intent.candidates();
        let payload = candidates[0].payload.as_ref().expect("payload");
        assert_eq!(payload["subject"], "Weekly digest");
        assert_eq!(payload["include_quizzes"], false);
        assert_eq!(payload["days_ahead"], 7);
        assert_eq!(payload["highlight_quiz_id"], 5);
    }

    #[test]
    fn test_missing_ids_fail_validation() {
        assert!(NotificationIntent::NewQuiz { quiz_id: None }
            .missing_id_error()
            .expect("error")
            .contains("quiz"));
        assert!(NotificationIntent::NewSubject {
            subject_id: None,
            subject_name: "Physics".to_string(),
        }
        .missing_id_error()
        .expect("error")
        .contains("subject"));
        assert!(NotificationIntent::NewChapter {
            chapter_id: None,
            chapter_name: "Optics".to_string(),
            subject_id: Some(3),
        }
        .missing_id_error()
        .expect("error")
        .contains("chapter"));
    }

    #[test]
    fn test_present_ids_pass_validation() {
        assert!(NotificationIntent::NewQuiz { quiz_id: Some(1) }
            .missing_id_error()
            .is_none());
        // Broadcast has no required identifier
        assert!(NotificationIntent::BroadcastAll(BroadcastOptions::default())
            .missing_id_error()
            .is_none());
        // A chapter without a parent subject is still valid
        assert!(NotificationIntent::NewChapter {
            chapter_id: Some(9),
            chapter_name: "Optics".to_string(),
            subject_id: None,
        }
        .missing_id_error()
        .is_none());
    }

    #[test]
    fn test_normalize_broadcast_with_count() {
        let data = json!({"users_notified": 12, "message": "Notifications sent successfully to 12 users"});
        let normalized = normalize_broadcast(&data);
        assert_eq!(normalized["sentCount"], 12);
        assert_eq!(
            normalized["message"],
            "Notifications sent successfully to 12 users"
        );
    }

    #[test]
    fn test_normalize_broadcast_defaults_to_all_sentinel() {
        let normalized = normalize_broadcast(&json!({}));
        assert_eq!(normalized["sentCount"], "all");
        assert_eq!(normalized["message"], "Notifications sent successfully");
    }
}
