//! Request orchestrator for AI-consuming actions.
//!
//! Sequences every metered action the same way: resolve the session,
//! load the entitlement profile, consult the quota policy, invoke the
//! upstream backend, then commit the usage counter. Failure exits:
//!
//! - unauthenticated: abort before any profile load or AI call
//! - profile load failure: abort, surfaced as retryable
//! - quota denied: abort, no AI call, no mutation
//! - upstream failure: abort, counters untouched
//! - commit failure: the AI result is still returned; the outcome
//!   carries the failed commit so accounting drift stays observable
//!
//! Concurrent calls for the same user are serialized with a per-identity
//! async mutex held from profile load through commit, so an overlapping
//! double-submit cannot race past the quota check. The store-level
//! conditional increment guards the same invariant a second time.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};
use uuid::Uuid;

use fusion_types::ai::{ChatOutcome, ImageOutcome};
use fusion_types::chat::ChatMessage;
use fusion_types::error::{ActionError, RepositoryError};
use fusion_types::profile::{Profile, UserId};
use fusion_types::quota::{CommitStatus, IncrementOutcome, MeteredAction, Remaining, UsageCounter};

use crate::ai::{ChatBackend, ImageBackend};
use crate::conversation::ConversationStore;
use crate::profile::ProfileRepository;
use crate::quota::QuotaPolicy;
use crate::session::SessionResolver;

/// Sequences auth, quota, upstream invocation, and usage commit for every
/// AI-consuming action.
///
/// Generic over the session, profile, and backend ports so fusion-core
/// never depends on fusion-infra.
pub struct ActionOrchestrator<S, P, C, I> {
    sessions: S,
    profiles: P,
    chat: C,
    images: I,
    conversations: Arc<ConversationStore>,
    locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl<S, P, C, I> ActionOrchestrator<S, P, C, I>
where
    S: SessionResolver,
    P: ProfileRepository,
    C: ChatBackend,
    I: ImageBackend,
{
    pub fn new(
        sessions: S,
        profiles: P,
        chat: C,
        images: I,
        conversations: Arc<ConversationStore>,
    ) -> Self {
        Self {
            sessions,
            profiles,
            chat,
            images,
            conversations,
            locks: DashMap::new(),
        }
    }

    /// Access the session resolver (used by the API layer for sign-out
    /// and non-orchestrated reads).
    pub fn sessions(&self) -> &S {
        &self.sessions
    }

    /// Send one chat message within a conversation session.
    ///
    /// On success the assistant reply has been appended to the
    /// conversation and exactly one daily-message increment committed.
    /// On upstream failure the user's message remains in the log and no
    /// counter changes.
    pub async fn send_message(
        &self,
        token: &str,
        session_id: Uuid,
        text: String,
    ) -> Result<ChatOutcome, ActionError> {
        let user = self.sessions.resolve(token).await?;
        let _guard = self.lock_profile(&user).await;

        let profile = self.load_profile(&user).await?;
        let decision = QuotaPolicy::evaluate(&profile, MeteredAction::SendMessage);
        if !decision.allowed {
            debug!(user_id = %user, "daily message quota exhausted");
            return Err(ActionError::QuotaExceeded {
                action: MeteredAction::SendMessage,
                remaining: decision.remaining,
            });
        }

        self.conversations.append(session_id, ChatMessage::user(text));
        let context = self.conversations.snapshot_for_request(&session_id);

        let reply = self.chat.send(&context).await?;

        let assistant = ChatMessage::assistant(reply.content);
        self.conversations.append(session_id, assistant.clone());

        let (commit, remaining) = self
            .commit_usage(&user, &profile, MeteredAction::SendMessage, decision.remaining)
            .await;

        Ok(ChatOutcome {
            message: assistant,
            remaining,
            commit,
        })
    }

    /// Generate one image from a prompt.
    ///
    /// The image counter is incremented for every tier -- pro usage is
    /// counted for accounting even though it is never enforced.
    pub async fn generate_image(
        &self,
        token: &str,
        prompt: &str,
    ) -> Result<ImageOutcome, ActionError> {
        let user = self.sessions.resolve(token).await?;
        let _guard = self.lock_profile(&user).await;

        let profile = self.load_profile(&user).await?;
        let decision = QuotaPolicy::evaluate(&profile, MeteredAction::GenerateImage);
        if !decision.allowed {
            debug!(user_id = %user, "image generation quota exhausted");
            return Err(ActionError::QuotaExceeded {
                action: MeteredAction::GenerateImage,
                remaining: decision.remaining,
            });
        }

        let image = self.images.generate(prompt).await?;

        let (commit, remaining) = self
            .commit_usage(&user, &profile, MeteredAction::GenerateImage, decision.remaining)
            .await;

        Ok(ImageOutcome {
            image,
            remaining,
            commit,
        })
    }

    /// Serialize same-user orchestrations from profile load through commit.
    async fn lock_profile(&self, user: &UserId) -> tokio::sync::OwnedMutexGuard<()> {
        let mutex = self.locks.entry(*user).or_default().clone();
        mutex.lock_owned().await
    }

    async fn load_profile(&self, user: &UserId) -> Result<Profile, ActionError> {
        match self.profiles.get(user).await {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => {
                // An authenticated user without a profile row is an
                // inconsistent account state; surfaced, not recovered.
                error!(user_id = %user, "no profile row for authenticated user");
                Err(ActionError::ProfileLoad(RepositoryError::NotFound))
            }
            Err(e) => {
                error!(user_id = %user, error = %e, "profile load failed");
                Err(ActionError::ProfileLoad(e))
            }
        }
    }

    /// Commit exactly one counter increment after a successful upstream
    /// call. Awaited for both actions; a failure is reported in the
    /// outcome rather than masking the upstream result.
    async fn commit_usage(
        &self,
        user: &UserId,
        profile: &Profile,
        action: MeteredAction,
        pre_remaining: Remaining,
    ) -> (CommitStatus, Remaining) {
        let counter = UsageCounter::for_action(action);
        let limit = QuotaPolicy::limit(profile.tier, action);

        match self.profiles.try_increment(user, counter, limit).await {
            Ok(IncrementOutcome {
                committed: true,
                new_value,
            }) => {
                debug!(user_id = %user, counter = %counter, new_value, "usage committed");
                (
                    CommitStatus::Committed { new_value },
                    QuotaPolicy::remaining_at(profile.tier, action, new_value),
                )
            }
            Ok(IncrementOutcome {
                committed: false,
                new_value,
            }) => {
                // The store guard tripped even though the policy check
                // passed under the lock: an external writer moved the
                // counter. The upstream call already happened, so this is
                // drift to monitor, not an error to surface.
                warn!(user_id = %user, counter = %counter, new_value, "usage commit rejected by store guard");
                (
                    CommitStatus::Rejected,
                    QuotaPolicy::remaining_at(profile.tier, action, new_value),
                )
            }
            Err(e) => {
                warn!(user_id = %user, counter = %counter, error = %e, "usage commit failed; upstream result still returned");
                (
                    CommitStatus::Failed {
                        reason: e.to_string(),
                    },
                    pre_remaining,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use fusion_types::ai::{ChatReply, GeneratedImage};
    use fusion_types::error::{BackendError, SessionError};
    use fusion_types::profile::Tier;

    // --- In-memory fakes for the orchestrator ports ---

    struct FakeSessions {
        user: Option<UserId>,
    }

    impl SessionResolver for FakeSessions {
        async fn resolve(&self, _token: &str) -> Result<UserId, SessionError> {
            self.user.ok_or(SessionError::Unauthenticated)
        }

        async fn revoke(&self, _token: &str) -> Result<(), SessionError> {
            Ok(())
        }
    }

    struct FakeProfiles {
        profiles: DashMap<UserId, Profile>,
        loads: AtomicU32,
        fail_increment: bool,
    }

    impl FakeProfiles {
        fn with(profile: Profile) -> Self {
            let profiles = DashMap::new();
            profiles.insert(profile.user_id, profile);
            Self {
                profiles,
                loads: AtomicU32::new(0),
                fail_increment: false,
            }
        }

        fn count(&self, user: &UserId, counter: UsageCounter) -> u32 {
            let profile = self.profiles.get(user).unwrap();
            match counter {
                UsageCounter::DailyMessages => profile.daily_message_count,
                UsageCounter::ImageGenerations => profile.image_generation_count,
            }
        }
    }

    impl ProfileRepository for FakeProfiles {
        async fn create(&self, profile: &Profile) -> Result<(), RepositoryError> {
            self.profiles.insert(profile.user_id, profile.clone());
            Ok(())
        }

        async fn get(&self, user_id: &UserId) -> Result<Option<Profile>, RepositoryError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(self.profiles.get(user_id).map(|p| p.value().clone()))
        }

        async fn set_tier(&self, user_id: &UserId, tier: Tier) -> Result<(), RepositoryError> {
            self.profiles
                .get_mut(user_id)
                .map(|mut p| p.tier = tier)
                .ok_or(RepositoryError::NotFound)
        }

        async fn try_increment(
            &self,
            user_id: &UserId,
            counter: UsageCounter,
            limit: Option<u32>,
        ) -> Result<IncrementOutcome, RepositoryError> {
            if self.fail_increment {
                return Err(RepositoryError::Connection);
            }
            let mut profile = self
                .profiles
                .get_mut(user_id)
                .ok_or(RepositoryError::NotFound)?;
            let value = match counter {
                UsageCounter::DailyMessages => &mut profile.daily_message_count,
                UsageCounter::ImageGenerations => &mut profile.image_generation_count,
            };
            if let Some(limit) = limit {
                if *value >= limit {
                    return Ok(IncrementOutcome {
                        committed: false,
                        new_value: *value,
                    });
                }
            }
            *value += 1;
            Ok(IncrementOutcome {
                committed: true,
                new_value: *value,
            })
        }

        async fn reset_daily_message_counts(&self) -> Result<u64, RepositoryError> {
            let mut reset = 0;
            for mut entry in self.profiles.iter_mut() {
                if entry.daily_message_count > 0 {
                    entry.daily_message_count = 0;
                    reset += 1;
                }
            }
            Ok(reset)
        }
    }

    struct FakeChat {
        reply: String,
        fail: bool,
        calls: AtomicU32,
    }

    impl FakeChat {
        fn replying(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                fail: false,
                calls: AtomicU32::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                reply: String::new(),
                fail: true,
                calls: AtomicU32::new(0),
            }
        }
    }

    impl ChatBackend for FakeChat {
        async fn send(&self, _messages: &[ChatMessage]) -> Result<ChatReply, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(BackendError::Api {
                    status: 500,
                    message: "upstream exploded".to_string(),
                });
            }
            Ok(ChatReply {
                content: self.reply.clone(),
            })
        }
    }

    struct FakeImages {
        fail: bool,
        calls: AtomicU32,
    }

    impl FakeImages {
        fn working() -> Self {
            Self {
                fail: false,
                calls: AtomicU32::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                calls: AtomicU32::new(0),
            }
        }
    }

    impl ImageBackend for FakeImages {
        async fn generate(&self, _prompt: &str) -> Result<GeneratedImage, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(BackendError::Timeout);
            }
            Ok(GeneratedImage {
                image_url: "https://img.example/generated.png".to_string(),
            })
        }
    }

    type TestOrchestrator = ActionOrchestrator<FakeSessions, FakeProfiles, FakeChat, FakeImages>;

    fn profile(tier: Tier, messages: u32, images: u32) -> Profile {
        let mut p = Profile::new(UserId::new());
        p.tier = tier;
        p.daily_message_count = messages;
        p.image_generation_count = images;
        p
    }

    fn orchestrator(user: Option<UserId>, profiles: FakeProfiles, chat: FakeChat, images: FakeImages) -> TestOrchestrator {
        ActionOrchestrator::new(
            FakeSessions { user },
            profiles,
            chat,
            images,
            Arc::new(ConversationStore::new()),
        )
    }

    #[tokio::test]
    async fn test_free_user_at_fourteen_sends_and_commits() {
        let profile = profile(Tier::Free, 14, 0);
        let user = profile.user_id;
        let orch = orchestrator(
            Some(user),
            FakeProfiles::with(profile),
            FakeChat::replying("here you go"),
            FakeImages::working(),
        );

        let session = orch.conversations.open();
        let outcome = orch
            .send_message("token", session, "hello".to_string())
            .await
            .unwrap();

        assert_eq!(outcome.message.content, "here you go");
        assert_eq!(outcome.commit, CommitStatus::Committed { new_value: 15 });
        assert_eq!(outcome.remaining, Remaining::Limited(0));
        assert_eq!(
            orch.profiles.count(&user, UsageCounter::DailyMessages),
            15
        );
    }

    #[tokio::test]
    async fn test_free_user_at_limit_denied_without_ai_call() {
        let profile = profile(Tier::Free, 15, 0);
        let user = profile.user_id;
        let orch = orchestrator(
            Some(user),
            FakeProfiles::with(profile),
            FakeChat::replying("unreachable"),
            FakeImages::working(),
        );

        let session = orch.conversations.open();
        let err = orch
            .send_message("token", session, "one more".to_string())
            .await
            .unwrap_err();

        match err {
            ActionError::QuotaExceeded { action, remaining } => {
                assert_eq!(action, MeteredAction::SendMessage);
                assert_eq!(remaining, Remaining::Limited(0));
            }
            other => panic!("expected QuotaExceeded, got {other:?}"),
        }
        assert_eq!(orch.chat.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            orch.profiles.count(&user, UsageCounter::DailyMessages),
            15
        );
        // The denied message never entered the conversation.
        assert!(orch.conversations.messages(&session).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pro_image_always_allowed_and_still_counted() {
        let profile = profile(Tier::Pro, 0, 940);
        let user = profile.user_id;
        let orch = orchestrator(
            Some(user),
            FakeProfiles::with(profile),
            FakeChat::replying(""),
            FakeImages::working(),
        );

        let outcome = orch.generate_image("token", "a city at night").await.unwrap();

        assert_eq!(outcome.remaining, Remaining::Unlimited);
        assert_eq!(outcome.commit, CommitStatus::Committed { new_value: 941 });
        assert_eq!(
            orch.profiles.count(&user, UsageCounter::ImageGenerations),
            941
        );
    }

    #[tokio::test]
    async fn test_unauthenticated_aborts_before_profile_load() {
        let profile = profile(Tier::Free, 0, 0);
        let orch = orchestrator(
            None,
            FakeProfiles::with(profile),
            FakeChat::replying("unreachable"),
            FakeImages::working(),
        );

        let session = orch.conversations.open();
        let err = orch
            .send_message("token", session, "hi".to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, ActionError::Unauthenticated));
        assert_eq!(orch.profiles.loads.load(Ordering::SeqCst), 0);
        assert_eq!(orch.chat.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_upstream_image_call_never_consumes_quota() {
        let profile = profile(Tier::Free, 0, 4);
        let user = profile.user_id;
        let orch = orchestrator(
            Some(user),
            FakeProfiles::with(profile),
            FakeChat::replying(""),
            FakeImages::failing(),
        );

        let err = orch.generate_image("token", "a dragon").await.unwrap_err();

        assert!(matches!(err, ActionError::Upstream(_)));
        assert_eq!(orch.images.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            orch.profiles.count(&user, UsageCounter::ImageGenerations),
            4
        );
    }

    #[tokio::test]
    async fn test_failed_upstream_chat_call_never_consumes_quota() {
        let profile = profile(Tier::Free, 7, 0);
        let user = profile.user_id;
        let orch = orchestrator(
            Some(user),
            FakeProfiles::with(profile),
            FakeChat::failing(),
            FakeImages::working(),
        );

        let session = orch.conversations.open();
        let err = orch
            .send_message("token", session, "hi".to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, ActionError::Upstream(_)));
        assert_eq!(
            orch.profiles.count(&user, UsageCounter::DailyMessages),
            7
        );
        // The user's message stays in the log; only the reply is missing.
        let messages = orch.conversations.messages(&session).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "hi");
    }

    #[tokio::test]
    async fn test_commit_failure_still_returns_reply() {
        let profile = profile(Tier::Free, 3, 0);
        let user = profile.user_id;
        let mut profiles = FakeProfiles::with(profile);
        profiles.fail_increment = true;
        let orch = orchestrator(
            Some(user),
            profiles,
            FakeChat::replying("still yours"),
            FakeImages::working(),
        );

        let session = orch.conversations.open();
        let outcome = orch
            .send_message("token", session, "hello".to_string())
            .await
            .unwrap();

        assert_eq!(outcome.message.content, "still yours");
        assert!(matches!(outcome.commit, CommitStatus::Failed { .. }));
        // Counter untouched; remaining reported from the pre-action state.
        assert_eq!(orch.profiles.count(&user, UsageCounter::DailyMessages), 3);
        assert_eq!(outcome.remaining, Remaining::Limited(12));
    }

    #[tokio::test]
    async fn test_concurrent_double_submit_at_fourteen() {
        let profile = profile(Tier::Free, 14, 0);
        let user = profile.user_id;
        let orch = Arc::new(orchestrator(
            Some(user),
            FakeProfiles::with(profile),
            FakeChat::replying("ok"),
            FakeImages::working(),
        ));

        let a = orch.conversations.open();
        let b = orch.conversations.open();
        let (first, second) = tokio::join!(
            orch.send_message("token", a, "first".to_string()),
            orch.send_message("token", b, "second".to_string()),
        );

        let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one of two racing sends may pass");
        let denied = [first, second]
            .into_iter()
            .filter(|r| {
                matches!(
                    r,
                    Err(ActionError::QuotaExceeded {
                        action: MeteredAction::SendMessage,
                        ..
                    })
                )
            })
            .count();
        assert_eq!(denied, 1);
        assert_eq!(
            orch.profiles.count(&user, UsageCounter::DailyMessages),
            15
        );
    }

    #[tokio::test]
    async fn test_two_turns_preserve_conversation_order() {
        let profile = profile(Tier::Pro, 0, 0);
        let user = profile.user_id;
        let orch = orchestrator(
            Some(user),
            FakeProfiles::with(profile),
            FakeChat::replying("reply"),
            FakeImages::working(),
        );

        let session = orch.conversations.open();
        orch.send_message("token", session, "one".to_string())
            .await
            .unwrap();
        orch.send_message("token", session, "two".to_string())
            .await
            .unwrap();

        let messages = orch.conversations.messages(&session).unwrap();
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["one", "reply", "two", "reply"]);
    }
}
