use uuid::Uuid;

use cinevault_auth::domain::repository::{Cache, CredentialStore};
use cinevault_auth::domain::types::{AuthUser, NewUser};
use cinevault_auth::error::AuthServiceError;
use cinevault_auth::usecase::password::{
    RequestPasswordResetUseCase, ResetRequestOutcome, UpdatePasswordInput, UpdatePasswordUseCase,
};
use cinevault_auth_types::password::PasswordHasher;
use cinevault_domain::credential::Email;

use crate::helpers::{MockCache, MockCredentialStore, MockMailSender, TEST_PASSWORD, test_user};

const RESET_KEY: &str = "password_reset:ada@example.com";

struct Fixture {
    users: MockCredentialStore,
    cache: MockCache,
    mailer: MockMailSender,
    hasher: PasswordHasher,
}

impl Fixture {
    fn new() -> Self {
        let hasher = PasswordHasher::new().unwrap();
        Self {
            users: MockCredentialStore::new(vec![test_user(&hasher)]),
            cache: MockCache::new(),
            mailer: MockMailSender::new(),
            hasher,
        }
    }

    fn request_reset(
        &self,
    ) -> RequestPasswordResetUseCase<MockCredentialStore, MockCache, MockMailSender> {
        RequestPasswordResetUseCase {
            users: self.users.clone(),
            cache: self.cache.clone(),
            mailer: self.mailer.clone(),
            code_ttl_secs: 900,
        }
    }

    fn update_password(&self) -> UpdatePasswordUseCase<MockCredentialStore, MockCache> {
        UpdatePasswordUseCase {
            users: self.users.clone(),
            cache: self.cache.clone(),
            hasher: self.hasher.clone(),
            code_ttl_secs: 900,
        }
    }

    fn verifies(&self, password: &str) -> bool {
        let hash = self.users.password_hash_of("ada@example.com").unwrap();
        self.hasher.verify(password, &hash).unwrap()
    }
}

fn update(code: &str, new_password: &str) -> UpdatePasswordInput {
    UpdatePasswordInput {
        email: "ada@example.com".to_owned(),
        code: code.to_owned(),
        new_password: new_password.to_owned(),
    }
}

// ── RequestPasswordResetUseCase ──────────────────────────────────────────────

#[tokio::test]
async fn should_store_digest_and_mail_code() {
    let fx = Fixture::new();

    let outcome = fx.request_reset().execute("Ada@Example.com").await.unwrap();
    assert!(outcome.code_sent());

    let code = fx.mailer.last_code().unwrap();
    assert_eq!(code.len(), 12);
    let stored = fx.cache.value(RESET_KEY).unwrap();
    assert_ne!(stored, code);
    assert_eq!(fx.cache.ttl(RESET_KEY), Some(900));
    assert_eq!(fx.mailer.sent()[0].to, "ada@example.com");
}

#[tokio::test]
async fn should_return_false_for_unknown_email() {
    let fx = Fixture::new();

    let outcome = fx.request_reset().execute("nobody@example.com").await.unwrap();
    assert!(matches!(outcome, ResetRequestOutcome::UnknownEmail));
    assert!(fx.mailer.sent().is_empty());
    assert!(fx.cache.entries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_discard_code_when_mail_fails() {
    let fx = Fixture {
        mailer: MockMailSender::failing(),
        ..Fixture::new()
    };

    let result = fx.request_reset().execute("ada@example.com").await;

    assert!(
        matches!(
            result,
            Ok(ResetRequestOutcome::Undelivered(AuthServiceError::UpstreamUnavailable(_)))
        ),
        "expected undelivered code, got {result:?}"
    );
    assert!(fx.cache.value(RESET_KEY).is_none());
}

#[tokio::test]
async fn should_surface_failed_lookup() {
    let fx = Fixture {
        users: MockCredentialStore {
            fail_lookups: true,
            ..MockCredentialStore::empty()
        },
        ..Fixture::new()
    };

    let result = fx.request_reset().execute("ada@example.com").await;

    assert!(
        matches!(result, Err(AuthServiceError::UpstreamUnavailable(_))),
        "expected UpstreamUnavailable, got {result:?}"
    );
    assert!(fx.mailer.sent().is_empty());
}

// ── UpdatePasswordUseCase ────────────────────────────────────────────────────

#[tokio::test]
async fn should_update_password_with_valid_code_once() {
    let fx = Fixture::new();
    fx.request_reset().execute("ada@example.com").await.unwrap();
    let code = fx.mailer.last_code().unwrap();

    fx.update_password()
        .execute(update(&code, "newpass1"))
        .await
        .unwrap();

    assert!(fx.verifies("newpass1"));
    assert!(!fx.verifies(TEST_PASSWORD));

    let replay = fx.update_password().execute(update(&code, "other1pass")).await;
    assert!(
        matches!(replay, Err(AuthServiceError::CodeInvalid)),
        "expected CodeInvalid, got {replay:?}"
    );
    assert!(fx.verifies("newpass1"));
}

#[tokio::test]
async fn should_invalidate_previous_code_on_new_request() {
    let fx = Fixture::new();
    fx.request_reset().execute("ada@example.com").await.unwrap();
    let first = fx.mailer.last_code().unwrap();
    fx.request_reset().execute("ada@example.com").await.unwrap();
    let second = fx.mailer.last_code().unwrap();

    assert_ne!(first, second);

    let result = fx.update_password().execute(update(&first, "newpass1")).await;
    assert!(matches!(result, Err(AuthServiceError::CodeInvalid)));
    fx.update_password()
        .execute(update(&second, "newpass1"))
        .await
        .unwrap();
    assert!(fx.verifies("newpass1"));
}

#[tokio::test]
async fn should_reject_weak_password_without_consuming_code() {
    let fx = Fixture::new();
    fx.request_reset().execute("ada@example.com").await.unwrap();
    let code = fx.mailer.last_code().unwrap();

    let result = fx.update_password().execute(update(&code, "short")).await;
    assert!(
        matches!(result, Err(AuthServiceError::InvalidInput(_))),
        "expected InvalidInput, got {result:?}"
    );
    assert!(fx.cache.value(RESET_KEY).is_some());
    assert!(fx.verifies(TEST_PASSWORD));
}

#[tokio::test]
async fn should_reject_expired_or_unknown_code() {
    let fx = Fixture::new();
    fx.request_reset().execute("ada@example.com").await.unwrap();
    let code = fx.mailer.last_code().unwrap();
    fx.cache.expire(RESET_KEY);

    let expired = fx.update_password().execute(update(&code, "newpass1")).await;
    assert!(matches!(expired, Err(AuthServiceError::CodeInvalid)));

    let unknown_user = fx
        .update_password()
        .execute(UpdatePasswordInput {
            email: "nobody@example.com".to_owned(),
            ..update(&code, "newpass1")
        })
        .await;
    assert!(matches!(unknown_user, Err(AuthServiceError::CodeInvalid)));
    assert!(fx.verifies(TEST_PASSWORD));
}

#[tokio::test]
async fn should_keep_code_usable_when_password_write_fails() {
    let fx = Fixture::new();
    fx.request_reset().execute("ada@example.com").await.unwrap();
    let code = fx.mailer.last_code().unwrap();
    fx.users.fail_next_writes(1);

    let failed = fx.update_password().execute(update(&code, "newpass1")).await;
    assert!(
        matches!(failed, Err(AuthServiceError::UpstreamUnavailable(_))),
        "expected UpstreamUnavailable, got {failed:?}"
    );
    assert!(fx.verifies(TEST_PASSWORD));
    assert_eq!(fx.cache.ttl(RESET_KEY), Some(900));

    fx.update_password()
        .execute(update(&code, "newpass1"))
        .await
        .unwrap();
    assert!(fx.verifies("newpass1"));
    assert!(fx.cache.value(RESET_KEY).is_none());
}

/// Store whose password write fails after a newer code has been issued.
struct ReissueOnWrite {
    inner: MockCredentialStore,
    cache: MockCache,
}

impl CredentialStore for ReissueOnWrite {
    async fn find_by_email(&self, email: &Email) -> Result<Option<AuthUser>, AuthServiceError> {
        self.inner.find_by_email(email).await
    }

    async fn create(&self, user: &NewUser) -> Result<(), AuthServiceError> {
        self.inner.create(user).await
    }

    async fn update_password(&self, _: Uuid, _: &str) -> Result<(), AuthServiceError> {
        self.cache.set_ex(RESET_KEY, "newer-digest", 900).await?;
        Err(AuthServiceError::upstream(anyhow::anyhow!("db down")))
    }
}

#[tokio::test]
async fn should_not_restore_code_over_newer_one() {
    let fx = Fixture::new();
    fx.request_reset().execute("ada@example.com").await.unwrap();
    let code = fx.mailer.last_code().unwrap();
    let usecase = UpdatePasswordUseCase {
        users: ReissueOnWrite {
            inner: fx.users.clone(),
            cache: fx.cache.clone(),
        },
        cache: fx.cache.clone(),
        hasher: fx.hasher.clone(),
        code_ttl_secs: 900,
    };

    let result = usecase.execute(update(&code, "newpass1")).await;

    assert!(matches!(result, Err(AuthServiceError::UpstreamUnavailable(_))));
    assert_eq!(fx.cache.value(RESET_KEY).as_deref(), Some("newer-digest"));
}

#[tokio::test]
async fn should_accept_lowercase_code() {
    let fx = Fixture::new();
    fx.request_reset().execute("ada@example.com").await.unwrap();
    let code = fx.mailer.last_code().unwrap().to_lowercase();

    fx.update_password()
        .execute(update(&format!(" {code} "), "newpass1"))
        .await
        .unwrap();
    assert!(fx.verifies("newpass1"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn should_let_exactly_one_concurrent_consumer_win() {
    let fx = Fixture::new();
    fx.request_reset().execute("ada@example.com").await.unwrap();
    let code = fx.mailer.last_code().unwrap();

    let attempts = (0..8).map(|i| {
        let usecase = fx.update_password();
        let input = update(&code, &format!("racer{i}pass"));
        async move { usecase.execute(input).await }
    });
    let results = futures::future::join_all(attempts).await;

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(
        results
            .iter()
            .filter(|r| r.is_err())
            .all(|r| matches!(r, Err(AuthServiceError::CodeInvalid)))
    );
}
