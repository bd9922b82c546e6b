use super::{Notice, Notifier};
use crate::i18n::Translator;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Rewrites keyed notices into the translator's current language, then
/// forwards them.
///
/// A notice whose key is missing from both dictionaries keeps its English
/// message. Notices without a key pass through untouched.
pub struct LocalizedNotifier {
    inner: Arc<dyn Notifier>,
    translator: Arc<Translator>,
}

impl LocalizedNotifier {
    pub fn new(inner: Arc<dyn Notifier>, translator: Arc<Translator>) -> Self {
        Self { inner, translator }
    }

    pub fn localize(&self, mut notice: Notice) -> Notice {
        if let Some(key) = notice.key.as_deref() {
            let params: HashMap<&str, String> = notice
                .params
                .iter()
                .map(|(k, v)| (k.as_str(), v.clone()))
                .collect();
            notice.message = self.translator.t_or_with(key, &notice.message, &params);
        }
        notice
    }
}

#[async_trait]
impl Notifier for LocalizedNotifier {
    async fn notify(&self, notice: Notice) {
        let notice = self.localize(notice);
        self.inner.notify(notice).await;
    }
}
