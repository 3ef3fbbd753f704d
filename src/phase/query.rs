//! Phases over query and simulator traffic.

use crate::rewrite::Rewriter;

use super::context::VisitResult;
use super::error::MapperError;

/// Path reported on diagnostics about a query.
pub const QUERY_PATH: &str = "query";

/// Translates a verification query.
///
/// The rewriter holds the query text as produced by the previous query
/// phase. Rejections are back-mapped through the earlier query phases before
/// they reach the caller.
pub trait QueryPhase {
    fn name(&self) -> &str;

    fn map_query(&mut self, query: &mut Rewriter) -> VisitResult;
}

/// Translates simulator traffic. Both directions default to the identity.
pub trait SimulatorPhase {
    fn name(&self) -> &str;

    fn map_request(&mut self, request: &str) -> Result<String, MapperError> {
        Ok(request.to_string())
    }

    fn map_response(&mut self, response: &str) -> Result<String, MapperError> {
        Ok(response.to_string())
    }
}
