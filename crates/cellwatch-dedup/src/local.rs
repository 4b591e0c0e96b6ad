//! In-process classifier backed by a [`BatchResolver`].

use std::sync::Arc;

use async_trait::async_trait;
use cellwatch_core::{BatchContext, CheckItem, Classification, DedupError, DuplicateClassifier};

use crate::resolver::BatchResolver;

/// Runs classification against a local resolver instead of over HTTP.
///
/// Each call gets its own [`BatchContext`], so resolver diagnostics stay
/// separate from the checker's.
#[derive(Clone)]
pub struct LocalClassifier {
    resolver: Arc<BatchResolver>,
}

impl LocalClassifier {
    pub fn new(resolver: Arc<BatchResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl DuplicateClassifier for LocalClassifier {
    async fn classify(&self, items: Vec<CheckItem>) -> Result<Vec<Classification>, DedupError> {
        let ctx = BatchContext::new();
        Ok(self.resolver.resolve_items(&items, &ctx).await)
    }

    fn name(&self) -> &str {
        "local"
    }
}
