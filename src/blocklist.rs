use std::sync::Arc;

use headless_chrome::browser::tab::{RequestInterceptor, RequestPausedDecision};
use headless_chrome::browser::transport::{SessionId, Transport};
use headless_chrome::protocol::cdp::Fetch::events::RequestPausedEvent;
use headless_chrome::protocol::cdp::Fetch::{FailRequest, RequestPattern, RequestStage};
use headless_chrome::protocol::cdp::Network::{ErrorReason, ResourceType};
use headless_chrome::Tab;
use tracing::debug;
use url::Url;

use crate::errors::{DriverError, Result};

/// Domains whose requests are aborted regardless of resource type.
const BLOCKED_DOMAINS: &[&str] = &["googletagmanager.com"];

/// Abort image requests and anything addressed to a blocked domain, let
/// every other request continue unmodified.
pub fn should_block(resource_type: &ResourceType, url: &str) -> bool {
    if matches!(resource_type, ResourceType::Image) {
        return true;
    }
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    BLOCKED_DOMAINS
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
}

struct ResourceBlocklist;

impl RequestInterceptor for ResourceBlocklist {
    fn intercept(
        &self,
        _transport: Arc<Transport>,
        _session_id: SessionId,
        event: RequestPausedEvent,
    ) -> RequestPausedDecision {
        let params = event.params;
        if should_block(&params.resource_Type, &params.request.url) {
            debug!(url = %params.request.url, "request aborted by blocklist");
            RequestPausedDecision::Fail(FailRequest {
                request_id: params.request_id,
                error_reason: ErrorReason::BlockedByClient,
            })
        } else {
            RequestPausedDecision::Continue(None)
        }
    }
}

/// Registers the blocklist as a standing request filter on the tab.
pub(crate) fn register(tab: &Arc<Tab>) -> Result<()> {
    let patterns = vec![RequestPattern {
        url_pattern: Some("*".to_string()),
        resource_Type: None,
        request_stage: Some(RequestStage::Request),
    }];
    tab.enable_fetch(Some(&patterns), None)
        .map_err(|e| DriverError::LaunchFailed(e.to_string()))?;
    tab.enable_request_interception(Arc::new(ResourceBlocklist))
        .map_err(|e| DriverError::LaunchFailed(e.to_string()))?;
    debug!("request blocklist registered");
    Ok(())
}
