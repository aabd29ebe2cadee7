//! Preview and create execution.
//!
//! Create calls go through an explicit `PendingLookup → Ready → Mutated`
//! sequence. A [`Ready`] value can only be produced by a lookup that
//! succeeded (or was declared unnecessary), and the mutating step is only
//! reachable from a `Ready`. A failed lookup ends the sequence.

use crate::{Adapter, Plan, RenderedContent};
use serde::{Deserialize, Serialize};
use std::future::Future;
use syndic_core::{CreationResult, PublishMode};
use syndic_error::SyndicResult;
use tracing::{debug, instrument, warn};

/// How the lookup step treats a remote "not found".
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum LookupPolicy {
    /// Any lookup failure stops the sequence.
    #[default]
    Strict,
    /// 404, 410, 451 and "not found" answers mean "empty".
    BenignAbsence,
}

/// Lookup that has not run yet.
#[derive(Debug, Clone, Copy)]
pub struct PendingLookup {
    step: &'static str,
    policy: LookupPolicy,
}

impl PendingLookup {
    /// Names the lookup step and its policy.
    pub fn new(step: &'static str, policy: LookupPolicy) -> Self {
        Self { step, policy }
    }

    /// Runs the lookup once.
    ///
    /// # Errors
    ///
    /// Returns the lookup error, unless the policy is
    /// [`LookupPolicy::BenignAbsence`] and the error only says the remote
    /// object is gone, in which case the value is `T::default()`.
    pub async fn run<T, F, Fut>(self, lookup: F) -> SyndicResult<Ready<T>>
    where
        T: Default,
        F: FnOnce() -> Fut,
        Fut: Future<Output = SyndicResult<T>>,
    {
        match lookup().await {
            Ok(value) => {
                debug!(step = self.step, "Lookup succeeded");
                Ok(Ready { value })
            }
            Err(e) if self.policy == LookupPolicy::BenignAbsence && e.is_benign_absence() => {
                warn!(step = self.step, error = %e, "Lookup found nothing, continuing with empty value");
                Ok(Ready {
                    value: T::default(),
                })
            }
            Err(e) => {
                warn!(step = self.step, error = %e, "Lookup failed");
                Err(e)
            }
        }
    }

    /// Marks the lookup as unnecessary because the value is already known.
    pub fn known<T>(self, value: T) -> Ready<T> {
        debug!(step = self.step, "Lookup not needed");
        Ready { value }
    }
}

/// Lookup result the mutating step may act on.
#[derive(Debug)]
pub struct Ready<T> {
    value: T,
}

impl<T> Ready<T> {
    /// The looked-up value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Runs the mutating step with the looked-up value.
    ///
    /// # Errors
    ///
    /// Returns the mutation error as-is.
    pub async fn mutate<R, F, Fut>(self, mutation: F) -> SyndicResult<Mutated<R>>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = SyndicResult<R>>,
    {
        let value = mutation(self.value).await?;
        debug!("Mutation succeeded");
        Ok(Mutated { value })
    }
}

/// Outcome of a mutating step.
#[derive(Debug)]
pub struct Mutated<R> {
    value: R,
}

impl<R> Mutated<R> {
    /// Unwraps the mutation's output.
    pub fn into_inner(self) -> R {
        self.value
    }
}

/// Runs a validated plan in preview or create mode.
///
/// # Errors
///
/// Returns transport and remote errors; the pipeline turns them into a
/// failed result.
#[instrument(
    skip_all,
    fields(platform = %adapter.name(), operation = %plan.operation().kind(), mode = %mode)
)]
pub async fn execute<A>(
    adapter: &A,
    plan: &Plan<'_>,
    rendered: &RenderedContent,
    mode: PublishMode,
) -> SyndicResult<CreationResult>
where
    A: Adapter + ?Sized,
{
    match mode {
        PublishMode::Preview => adapter.preview(plan, rendered).await,
        PublishMode::Create => adapter.create(plan, rendered).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syndic_error::{RemoteError, RemoteErrorKind, SyndicError, TransportError, TransportErrorKind};

    fn not_found() -> SyndicError {
        TransportError::new(TransportErrorKind::Status {
            status: 404,
            body: "Not Found".into(),
        })
        .into()
    }

    #[tokio::test]
    async fn test_benign_absence_becomes_default() {
        let ready = PendingLookup::new("labels", LookupPolicy::BenignAbsence)
            .run(|| async { Err::<Vec<String>, _>(not_found()) })
            .await
            .unwrap();
        assert!(ready.value().is_empty());
    }

    #[tokio::test]
    async fn test_strict_lookup_stops_before_mutation() {
        let mutated = std::sync::atomic::AtomicBool::new(false);
        let lookup = PendingLookup::new("issue id", LookupPolicy::Strict)
            .run(|| async { Err::<String, _>(not_found()) })
            .await;
        if let Ok(ready) = lookup {
            let _ = ready
                .mutate(|_| async {
                    mutated.store(true, std::sync::atomic::Ordering::SeqCst);
                    Ok::<_, SyndicError>(())
                })
                .await;
            panic!("strict lookup should fail");
        }
        assert!(!mutated.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_benign_policy_keeps_real_failures() {
        let result = PendingLookup::new("labels", LookupPolicy::BenignAbsence)
            .run(|| async {
                Err::<Vec<String>, SyndicError>(
                    RemoteError::new(RemoteErrorKind::GraphQl(vec!["rate limited".into()])).into(),
                )
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_mutation_receives_lookup_value() {
        let out = PendingLookup::new("repo id", LookupPolicy::Strict)
            .run(|| async { Ok::<_, SyndicError>("R_1".to_string()) })
            .await
            .unwrap()
            .mutate(|id| async move { Ok(format!("starred {id}")) })
            .await
            .unwrap()
            .into_inner();
        assert_eq!(out, "starred R_1");
    }
}
