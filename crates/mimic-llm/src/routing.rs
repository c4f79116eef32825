//! Model id resolution
//!
//! Clients address models as `<provider>/<model>`. The provider prefix picks
//! the upstream and the remainder is sent to it unchanged.

/// Resolved target for a model request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModel<'a> {
    /// Provider name (key in config)
    pub provider_name: &'a str,
    /// Model identifier to send to the provider
    pub model_id: &'a str,
}

/// Split a client model id on its first `/`
///
/// An id without `/` names both the provider and the model.
pub fn split_model_id(id: &str) -> ResolvedModel<'_> {
    let (provider_name, model_id) = id.split_once('/').unwrap_or((id, id));
    ResolvedModel { provider_name, model_id }
}

/// Client-facing id for a provider's model
pub fn qualified_model_id(provider_name: &str, model_id: &str) -> String {
    format!("{provider_name}/{model_id}")
}
