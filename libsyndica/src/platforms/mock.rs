//! Scripted remote client for tests
//!
//! Compiled in all builds so downstream crates can drive the full pipeline
//! without network access. Outcomes are queued per call; with an empty
//! script every call succeeds with a generated id.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{PlatformError, Result};
use crate::types::{PlatformKind, SocialAccount};

use super::client::{RemoteClient, RemotePost, RemoteRequest};

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub platform: PlatformKind,
    pub account_id: String,
    pub request: RemoteRequest,
}

pub struct MockRemoteClient {
    script: Mutex<Vec<std::result::Result<RemotePost, PlatformError>>>,
    platform_errors: Mutex<HashMap<PlatformKind, PlatformError>>,
    calls: Mutex<Vec<RecordedCall>>,
    deletes: Mutex<Vec<(PlatformKind, String)>>,
    delete_error: Mutex<Option<PlatformError>>,
    sequence: AtomicUsize,
}

impl MockRemoteClient {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Vec::new()),
            platform_errors: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            delete_error: Mutex::new(None),
            sequence: AtomicUsize::new(0),
        }
    }

    /// Queue the outcome for the next publish call. Outcomes are consumed in
    /// FIFO order.
    pub fn push_response(&self, outcome: std::result::Result<RemotePost, PlatformError>) {
        self.script.lock().unwrap().push(outcome);
    }

    /// Queue `n` consecutive failures with the same error.
    pub fn push_failures(&self, error: PlatformError, n: usize) {
        let mut script = self.script.lock().unwrap();
        for _ in 0..n {
            script.push(Err(error.clone()));
        }
    }

    /// Make every publish call against `platform` fail with `error`,
    /// regardless of the FIFO script. Useful under concurrent fan-out where
    /// call order is not deterministic.
    pub fn fail_platform_with(&self, platform: PlatformKind, error: PlatformError) {
        self.platform_errors.lock().unwrap().insert(platform, error);
    }

    /// Make every delete call fail with `error`.
    pub fn fail_deletes_with(&self, error: PlatformError) {
        *self.delete_error.lock().unwrap() = Some(error);
    }

    pub fn request_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn deleted_ids(&self) -> Vec<(PlatformKind, String)> {
        self.deletes.lock().unwrap().clone()
    }

    fn next_post(&self, platform: PlatformKind) -> RemotePost {
        let n = self.sequence.fetch_add(1, Ordering::SeqCst);
        RemotePost {
            id: format!("{platform}_{n}"),
            url: format!("https://{platform}.example/posts/{platform}_{n}"),
        }
    }
}

impl Default for MockRemoteClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteClient for MockRemoteClient {
    async fn execute(
        &self,
        platform: PlatformKind,
        account: &SocialAccount,
        request: &RemoteRequest,
    ) -> Result<RemotePost> {
        self.calls.lock().unwrap().push(RecordedCall {
            platform,
            account_id: account.id.clone(),
            request: request.clone(),
        });

        if let Some(e) = self.platform_errors.lock().unwrap().get(&platform) {
            return Err(e.clone().into());
        }

        let scripted = {
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                None
            } else {
                Some(script.remove(0))
            }
        };

        match scripted {
            Some(Ok(post)) => Ok(post),
            Some(Err(e)) => Err(e.into()),
            None => Ok(self.next_post(platform)),
        }
    }

    async fn delete(
        &self,
        platform: PlatformKind,
        _account: &SocialAccount,
        remote_post_id: &str,
    ) -> Result<()> {
        self.deletes
            .lock()
            .unwrap()
            .push((platform, remote_post_id.to_string()));

        match self.delete_error.lock().unwrap().clone() {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> SocialAccount {
        SocialAccount {
            id: "acct-1".to_string(),
            tenant_id: "tenant-1".to_string(),
            platform: PlatformKind::Twitter,
            display_name: "Test".to_string(),
            access_token: "token".to_string(),
            active: true,
        }
    }

    #[tokio::test]
    async fn test_default_success_with_generated_ids() {
        let mock = MockRemoteClient::new();
        let request = RemoteRequest::Status {
            body: "hi".to_string(),
            media_urls: vec![],
        };

        let a = mock
            .execute(PlatformKind::Twitter, &account(), &request)
            .await
            .unwrap();
        let b = mock
            .execute(PlatformKind::Twitter, &account(), &request)
            .await
            .unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(mock.request_count(), 2);
    }

    #[tokio::test]
    async fn test_scripted_outcomes_consumed_in_order() {
        let mock = MockRemoteClient::new();
        mock.push_response(Err(PlatformError::Transient("503".to_string())));
        mock.push_response(Ok(RemotePost {
            id: "fixed".to_string(),
            url: "https://example.com/fixed".to_string(),
        }));

        let request = RemoteRequest::Status {
            body: "hi".to_string(),
            media_urls: vec![],
        };
        assert!(mock
            .execute(PlatformKind::Twitter, &account(), &request)
            .await
            .is_err());
        let ok = mock
            .execute(PlatformKind::Twitter, &account(), &request)
            .await
            .unwrap();
        assert_eq!(ok.id, "fixed");
    }

    #[tokio::test]
    async fn test_delete_recording_and_failure() {
        let mock = MockRemoteClient::new();
        mock.delete(PlatformKind::Instagram, &account(), "ig_1")
            .await
            .unwrap();
        assert_eq!(
            mock.deleted_ids(),
            vec![(PlatformKind::Instagram, "ig_1".to_string())]
        );

        mock.fail_deletes_with(PlatformError::Fatal("gone".to_string()));
        assert!(mock
            .delete(PlatformKind::Instagram, &account(), "ig_2")
            .await
            .is_err());
    }
}
