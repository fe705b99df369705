// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::Result;
use super::backoff_policy::BackoffPolicy;
use super::error::Error;
use super::retry_policy::RetryPolicy;
use super::retry_result::RetryResult;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runs the retry loop for a given function.
///
/// This functions calls an inner function as long as (1) the retry policy
/// allows more attempts, and (2) the inner function has not returned a
/// successful request.
///
/// In between calls the function waits the amount of time prescribed by the
/// backoff policy, using `sleep` to implement any sleep. If `sleep` fails,
/// typically because the request was cancelled, the loop stops with that
/// error.
pub async fn retry_loop<F, S, Response>(
    inner: F,
    sleep: S,
    retry_policy: Arc<dyn RetryPolicy>,
    backoff_policy: Arc<dyn BackoffPolicy>,
) -> Result<Response>
where
    F: AsyncFnMut(u32) -> Result<Response> + Send,
    S: AsyncFn(Duration) -> Result<()> + Send,
{
    retry_loop_with_callback(inner, sleep, retry_policy, backoff_policy, |_, _, _| {}).await
}

/// Runs the retry loop for a given function with a callback for retries.
///
/// The inner function receives the attempt number, starting at 1. The
/// `on_retry` callback is called before sleeping, with the attempt count,
/// the error, and the delay.
pub async fn retry_loop_with_callback<F, S, OnRetry, Response>(
    mut inner: F,
    sleep: S,
    retry_policy: Arc<dyn RetryPolicy>,
    backoff_policy: Arc<dyn BackoffPolicy>,
    mut on_retry: OnRetry,
) -> Result<Response>
where
    F: AsyncFnMut(u32) -> Result<Response> + Send,
    S: AsyncFn(Duration) -> Result<()> + Send,
    OnRetry: FnMut(u32, &Error, Duration) + Send,
{
    let loop_start = tokio::time::Instant::now().into_std();
    let mut attempt_count = 0;
    loop {
        attempt_count += 1;
        let error = match inner(attempt_count).await {
            Ok(r) => return Ok(r),
            Err(e) => e,
        };
        match retry_policy.on_error(loop_start, attempt_count, error) {
            RetryResult::Permanent(e) | RetryResult::Exhausted(e) => return Err(e),
            RetryResult::Continue(e) => {
                let delay = backoff_policy.on_failure(loop_start, attempt_count);
                on_retry(attempt_count, &e, delay);
                sleep(delay).await?;
            }
        }
    }
}

/// Sleeps for `delay`, unless `cancel` is triggered first.
///
/// Returns an error satisfying [Error::is_cancelled] if the token is
/// cancelled before the delay elapses.
pub async fn cancellable_sleep(delay: Duration, cancel: Option<&CancellationToken>) -> Result<()> {
    match cancel {
        None => {
            tokio::time::sleep(delay).await;
            Ok(())
        }
        Some(token) => tokio::select! {
            _ = token.cancelled() => Err(Error::cancelled()),
            _ = tokio::time::sleep(delay) => Ok(()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::retry_policy::LimitedAttemptCount;

    #[tokio::test]
    async fn immediate_success() -> anyhow::Result<()> {
        // This test simulates a server immediate returning a successful
        // response.
        let mut call = MockCall::new();
        call.expect_call().once().returning(|_| success());
        let inner = async move |n| call.call(n);

        let retry_policy = MockRetryPolicy::new();
        let backoff_policy = MockBackoffPolicy::new();
        let sleep = MockSleep::new();

        let backoff = async move |d| sleep.sleep(d).await;
        let response = retry_loop(
            inner,
            backoff,
            to_retry_policy(retry_policy),
            to_backoff_policy(backoff_policy),
        )
        .await?;
        assert_eq!(response, "success");
        Ok(())
    }

    #[tokio::test]
    async fn immediate_failure() -> anyhow::Result<()> {
        // This test simulates a server responding with an immediate and
        // permanent error.
        let mut call = MockCall::new();
        call.expect_call().once().returning(|_| permanent());
        let inner = async move |n| call.call(n);

        let mut retry_policy = MockRetryPolicy::new();
        retry_policy
            .expect_on_error()
            .once()
            .returning(|_, _, e| RetryResult::Permanent(e));
        let backoff_policy = MockBackoffPolicy::new();
        let sleep = MockSleep::new();

        let backoff = async move |d| sleep.sleep(d).await;
        let response = retry_loop(
            inner,
            backoff,
            to_retry_policy(retry_policy),
            to_backoff_policy(backoff_policy),
        )
        .await;
        let err = response.unwrap_err();
        assert_eq!(err.kind(), "ValidationException", "{err:?}");
        Ok(())
    }

    #[tokio::test]
    async fn retry_success() -> anyhow::Result<()> {
        // This test simulates a server responding with two transient errors and
        // then with a successful response.
        let mut call_seq = mockall::Sequence::new();
        let mut call = MockCall::new();
        for n in 1..=2 {
            call.expect_call()
                .once()
                .in_sequence(&mut call_seq)
                .withf(move |got| *got == n)
                .returning(|_| transient());
        }
        call.expect_call()
            .once()
            .in_sequence(&mut call_seq)
            .withf(|got| *got == 3)
            .returning(|_| success());
        let inner = async move |n| call.call(n);

        let mut retry_policy = MockRetryPolicy::new();
        retry_policy
            .expect_on_error()
            .times(2)
            .returning(|_, _, e| RetryResult::Continue(e));
        let mut backoff_seq = mockall::Sequence::new();
        let mut backoff_policy = MockBackoffPolicy::new();
        backoff_policy
            .expect_on_failure()
            .once()
            .in_sequence(&mut backoff_seq)
            .withf(|_, count| *count == 1)
            .return_const(Duration::from_millis(100));
        backoff_policy
            .expect_on_failure()
            .once()
            .in_sequence(&mut backoff_seq)
            .withf(|_, count| *count == 2)
            .return_const(Duration::from_millis(200));

        let mut sleep_seq = mockall::Sequence::new();
        let mut sleep = MockSleep::new();
        sleep
            .expect_sleep()
            .once()
            .in_sequence(&mut sleep_seq)
            .withf(|d| *d == Duration::from_millis(100))
            .returning(|_| Box::pin(async { Ok(()) }));
        sleep
            .expect_sleep()
            .once()
            .in_sequence(&mut sleep_seq)
            .withf(|d| *d == Duration::from_millis(200))
            .returning(|_| Box::pin(async { Ok(()) }));

        let backoff = async move |d| sleep.sleep(d).await;
        let response = retry_loop(
            inner,
            backoff,
            to_retry_policy(retry_policy),
            to_backoff_policy(backoff_policy),
        )
        .await?;
        assert_eq!(response, "success");
        Ok(())
    }

    #[tokio::test]
    async fn too_many_transients() -> anyhow::Result<()> {
        // This test simulates a server responding with transient errors
        // until the retry policy is exhausted. The loop returns the last error.
        const ERRORS: u32 = 4;
        let mut call_seq = mockall::Sequence::new();
        let mut call = MockCall::new();
        for i in 1..=ERRORS {
            call.expect_call()
                .once()
                .in_sequence(&mut call_seq)
                .returning(move |_| numbered_transient(i));
        }
        let inner = async move |n| call.call(n);

        let retry_policy = Arc::new(LimitedAttemptCount::new(ERRORS - 1));
        let mut backoff_policy = MockBackoffPolicy::new();
        backoff_policy
            .expect_on_failure()
            .times(ERRORS as usize - 1)
            .return_const(Duration::ZERO);

        let mut sleep = MockSleep::new();
        sleep
            .expect_sleep()
            .times(ERRORS as usize - 1)
            .returning(|_| Box::pin(async { Ok(()) }));

        let backoff = async move |d| sleep.sleep(d).await;
        let response = retry_loop(
            inner,
            backoff,
            retry_policy,
            to_backoff_policy(backoff_policy),
        )
        .await;
        let err = response.unwrap_err();
        assert_eq!(err.message(), format!("count={ERRORS}"), "{err:?}");
        assert!(err.is_retry(), "{err:?}");
        Ok(())
    }

    #[tokio::test]
    async fn transient_then_permanent() -> anyhow::Result<()> {
        // This test simulates a server responding with a transient error
        // and then a permanent error. The retry loop should stop on the second
        // error.
        let mut call_seq = mockall::Sequence::new();
        let mut call = MockCall::new();
        call.expect_call()
            .once()
            .in_sequence(&mut call_seq)
            .returning(|_| transient());
        call.expect_call()
            .once()
            .in_sequence(&mut call_seq)
            .returning(|_| permanent());
        let inner = async move |n| call.call(n);

        let retry_policy = Arc::new(LimitedAttemptCount::new(5));
        let mut backoff_policy = MockBackoffPolicy::new();
        backoff_policy
            .expect_on_failure()
            .once()
            .return_const(Duration::ZERO);
        let mut sleep = MockSleep::new();
        sleep
            .expect_sleep()
            .once()
            .returning(|_| Box::pin(async { Ok(()) }));

        let backoff = async move |d| sleep.sleep(d).await;
        let response = retry_loop(
            inner,
            backoff,
            retry_policy,
            to_backoff_policy(backoff_policy),
        )
        .await;
        let err = response.unwrap_err();
        assert_eq!(err.kind(), "ValidationException", "{err:?}");
        Ok(())
    }

    #[tokio::test]
    async fn sleep_failure_stops_loop() -> anyhow::Result<()> {
        let mut call = MockCall::new();
        call.expect_call().once().returning(|_| transient());
        let inner = async move |n| call.call(n);

        let retry_policy = Arc::new(LimitedAttemptCount::new(5));
        let mut backoff_policy = MockBackoffPolicy::new();
        backoff_policy
            .expect_on_failure()
            .once()
            .return_const(Duration::from_secs(1));
        let mut sleep = MockSleep::new();
        sleep
            .expect_sleep()
            .once()
            .returning(|_| Box::pin(async { Err(Error::cancelled()) }));

        let backoff = async move |d| sleep.sleep(d).await;
        let response = retry_loop(
            inner,
            backoff,
            retry_policy,
            to_backoff_policy(backoff_policy),
        )
        .await;
        let err = response.unwrap_err();
        assert!(err.is_cancelled(), "{err:?}");
        Ok(())
    }

    #[tokio::test]
    async fn on_retry_callback() -> anyhow::Result<()> {
        let mut call_seq = mockall::Sequence::new();
        let mut call = MockCall::new();
        call.expect_call()
            .once()
            .in_sequence(&mut call_seq)
            .returning(|_| transient());
        call.expect_call()
            .once()
            .in_sequence(&mut call_seq)
            .returning(|_| success());
        let inner = async move |n| call.call(n);

        let mut retries = Vec::new();
        let response = retry_loop_with_callback(
            inner,
            async |_| Ok(()),
            Arc::new(LimitedAttemptCount::new(3)),
            Arc::new(crate::exponential_backoff::ExponentialBackoff::default()),
            |n, e: &Error, d| retries.push((n, e.kind().to_string(), d)),
        )
        .await?;
        assert_eq!(response, "success");
        assert_eq!(
            retries,
            vec![(1, "Throttling".to_string(), Duration::from_millis(100))]
        );
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn cancellable_sleep_completes() -> anyhow::Result<()> {
        let token = CancellationToken::new();
        let start = tokio::time::Instant::now();
        cancellable_sleep(Duration::from_millis(100), Some(&token)).await?;
        assert!(start.elapsed() >= Duration::from_millis(100));
        cancellable_sleep(Duration::from_millis(100), None).await?;
        assert!(start.elapsed() >= Duration::from_millis(200));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn cancellable_sleep_cancelled() {
        let token = CancellationToken::new();
        let start = tokio::time::Instant::now();
        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });
        let got = cancellable_sleep(Duration::from_secs(60), Some(&token)).await;
        assert!(matches!(&got, Err(e) if e.is_cancelled()), "{got:?}");
        assert!(start.elapsed() < Duration::from_secs(60));
    }

    fn success() -> Result<String> {
        Ok("success".into())
    }

    fn transient_details() -> ServiceError {
        ServiceError::default()
            .set_code(400_u16)
            .set_kind("Throttling")
            .set_message("Rate exceeded")
            .set_retry(true)
    }

    fn transient() -> Result<String> {
        Err(Error::service(transient_details()))
    }

    fn numbered_transient(i: u32) -> Result<String> {
        Err(Error::service(
            transient_details().set_message(format!("count={i}")),
        ))
    }

    fn permanent() -> Result<String> {
        let details = ServiceError::default()
            .set_code(400_u16)
            .set_kind("ValidationException")
            .set_message("uh-oh");
        Err(Error::service(details))
    }

    fn to_retry_policy(mock: MockRetryPolicy) -> Arc<dyn RetryPolicy> {
        Arc::new(mock)
    }

    fn to_backoff_policy(mock: MockBackoffPolicy) -> Arc<dyn BackoffPolicy> {
        Arc::new(mock)
    }

    trait Call {
        fn call(&self, n: u32) -> Result<String>;
    }

    mockall::mock! {
        Call {}
        impl Call for Call {
            fn call(&self, n: u32) -> Result<String>;
        }
    }

    trait Sleep {
        fn sleep(&self, d: Duration) -> impl Future<Output = Result<()>>;
    }

    mockall::mock! {
        Sleep {}
        impl Sleep for Sleep {
            fn sleep(&self, d: Duration) -> impl Future<Output = Result<()>> + Send;
        }
    }

    mockall::mock! {
        #[derive(Debug)]
        RetryPolicy {}
        impl RetryPolicy for RetryPolicy {
            fn on_error(
                &self,
                loop_start: std::time::Instant,
                attempt_count: u32,
                error: Error,
            ) -> RetryResult;
        }
    }

    mockall::mock! {
        #[derive(Debug)]
        BackoffPolicy {}
        impl BackoffPolicy for BackoffPolicy {
            fn on_failure(&self, loop_start: std::time::Instant, attempt_count: u32) -> Duration;
        }
    }
}
