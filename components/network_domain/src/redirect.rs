//! Redirect chain splicing
//!
//! When a request id that is already in flight is reused for a redirect,
//! the existing record is renamed and finished, and a fresh record takes
//! over the original id with the whole chain attached.

use crate::registry::InflightRegistry;
use crate::request::{NetworkRequest, RequestRef};
use tracing::debug;

/// Records produced by one redirect hop
#[derive(Debug)]
pub struct RedirectSplice {
    /// The hop that was just finished under its renamed id
    pub previous: RequestRef,
    /// The new record owning the original id; not yet started
    pub request: RequestRef,
}

/// Finish `previous` as a redirect hop and build its successor.
///
/// The previous record is renamed to `<id>:redirected.<n>`, where `n` is the
/// number of hops before it, and finished at `time` without a transfer size
/// update. The successor targets `redirect_url`, inherits frame, loader,
/// document URL and initiator, and carries the full chain in
/// [`redirects`](NetworkRequest::redirects).
pub fn splice(
    registry: &mut InflightRegistry,
    previous: RequestRef,
    time: f64,
    redirect_url: &str,
    event_capacity: usize,
    inspected_page_domain: Option<String>,
) -> RedirectSplice {
    let (request_id, mut chain) = {
        let mut record = previous.write();
        let original_id = record.request_id().to_string();
        let chain = record.take_redirects();
        record.set_request_id(format!("{}:redirected.{}", original_id, chain.len()));
        if let Some(last) = chain.last() {
            record.set_redirect_source(Some(last.clone()));
        }
        (original_id, chain)
    };

    registry.finish(&previous, time, None);

    let successor = {
        let record = previous.read();
        debug!(
            "Request {} redirected from {} to {}",
            request_id,
            record.url(),
            redirect_url
        );
        NetworkRequest::new(
            request_id,
            redirect_url,
            record.document_url(),
            record.frame_id(),
            record.loader_id(),
            record.initiator().cloned(),
        )
    };

    chain.push(previous.clone());
    let mut successor = successor
        .with_event_capacity(event_capacity)
        .with_inspected_page_domain(inspected_page_domain);
    successor.set_redirects(chain);

    RedirectSplice {
        previous,
        request: successor.into_ref(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::InitiatorKind;
    use std::sync::Arc;

    #[test]
    fn test_chain_ids_and_links() {
        let mut registry = InflightRegistry::default();
        let first = NetworkRequest::new("r1", "https://a.com/1", "https://a.com/", "F", "L", None)
            .into_ref();
        registry.start(&first);

        let hop = splice(&mut registry, first.clone(), 1.0, "https://a.com/2", 8, None);
        registry.start(&hop.request);
        assert_eq!(first.read().request_id(), "r1:redirected.0");
        assert!(first.read().finished());

        let hop2 = splice(&mut registry, hop.request.clone(), 2.0, "https://a.com/3", 8, None);
        let last = hop2.request.read();

        assert_eq!(last.request_id(), "r1");
        assert_eq!(last.url(), "https://a.com/3");
        assert_eq!(hop.request.read().request_id(), "r1:redirected.1");
        assert_eq!(last.redirects().len(), 2);
        assert!(Arc::ptr_eq(&last.redirects()[0], &first));
        assert!(Arc::ptr_eq(&last.redirects()[1], &hop.request));

        let source = last.redirect_source().unwrap();
        assert!(Arc::ptr_eq(&source, &hop.request));
        assert_eq!(last.initiator_info().kind, InitiatorKind::Redirect);

        let middle = hop.request.read();
        assert!(middle.redirects().is_empty());
        assert!(Arc::ptr_eq(&middle.redirect_source().unwrap(), &first));
    }
}
