//! The `publish` entry point.

use crate::{Adapter, ContentRenderer, Dispatcher, Platform, execute};
use syndic_core::{
    CanonicalObject, CreationResult, IncludeLink, MediaType, PublishMode, record_publish,
};
use tracing::{error, info, instrument, warn};

/// Message for text posts with nothing to publish.
pub const NO_CONTENT_MESSAGE: &str = "No content text found.";

/// Publishes canonical objects through one adapter.
///
/// Every call returns exactly one [`CreationResult`]; no error escapes.
#[derive(Debug, Clone)]
pub struct Publisher<A = Platform> {
    adapter: A,
}

impl<A: Adapter> Publisher<A> {
    /// Wraps an adapter.
    pub fn new(adapter: A) -> Self {
        Self { adapter }
    }

    /// The wrapped adapter.
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Previews or creates an object on the platform.
    #[instrument(skip(self, object), fields(platform = %self.adapter.name()))]
    pub async fn publish(
        &self,
        object: &CanonicalObject,
        mode: PublishMode,
        include_link: IncludeLink,
        ignore_formatting: bool,
    ) -> CreationResult {
        let grammar = self.adapter.grammar();

        let plan = match Dispatcher::new(grammar, self.adapter.capabilities()).dispatch(object) {
            Ok(plan) => plan,
            Err(aborted) => {
                warn!(error = %aborted.error_plain(), "Publish aborted");
                record_publish(self.adapter.name(), "none", aborted.outcome());
                return aborted;
            }
        };
        let operation = plan.operation().kind();

        let rendered =
            ContentRenderer::new(grammar).render(object, plan.operation(), include_link, ignore_formatting);
        if plan.operation().publishes_text() && rendered.is_empty() && !has_media(object) {
            warn!(%operation, "Nothing to publish");
            let result = CreationResult::failed(NO_CONTENT_MESSAGE);
            record_publish(self.adapter.name(), operation.as_ref(), result.outcome());
            return result;
        }

        let result = match execute(&self.adapter, &plan, &rendered, mode).await {
            Ok(result) => result,
            Err(e) => {
                error!(%operation, error = %e, "Publish failed");
                CreationResult::failed(e.message())
            }
        };

        info!(%operation, outcome = result.outcome(), "Publish finished");
        record_publish(self.adapter.name(), operation.as_ref(), result.outcome());
        result
    }
}

fn has_media(object: &CanonicalObject) -> bool {
    object
        .attachments()
        .iter()
        .any(|a| matches!(a.media_type(), MediaType::Image | MediaType::Video) && a.source_url().is_some())
}
