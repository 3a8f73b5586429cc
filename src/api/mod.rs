//! Call stubs for the two GROWI API families.
//!
//! Every stub resolves to one catalog entry in [`crate::operations`] and
//! dispatches through a [`RequestExecutor`]. Response types are chosen by the
//! caller; use [`serde_json::Value`] when no model is at hand.

mod v1;
mod v3;

use serde::de::DeserializeOwned;
use serde_json::Value;

pub use v1::ApiV1;
pub use v3::ApiV3;

use crate::ClientError;
use crate::cancel::CancellableRequest;
use crate::executor::RequestExecutor;
use crate::operations::{find_operation, parse_method, render_path};
use crate::request::{CallOptions, RequestDescription};

/// Dispatches `operation_id` of the executor's family.
pub(crate) fn call_operation<T>(
    executor: &RequestExecutor,
    operation_id: &str,
    path_params: &[(&str, &str)],
    query: Vec<(String, String)>,
    body: Option<Value>,
    options: CallOptions,
) -> Result<CancellableRequest<T>, ClientError>
where
    T: DeserializeOwned + Send + 'static,
{
    let operation = find_operation(executor.family(), operation_id)?;
    let rendered_path = render_path(operation, path_params)?;
    let method = parse_method(operation)?;

    let mut request = RequestDescription::new(method, rendered_path);
    request.query = query;
    request.body = body;
    executor.execute(request, options)
}

/// Query pairs for a stub, skipping absent optional values.
#[derive(Debug, Default)]
pub(crate) struct Query(Vec<(String, String)>);

impl Query {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set(mut self, key: &str, value: &(impl ToString + ?Sized)) -> Self {
        self.0.push((key.to_owned(), value.to_string()));
        self
    }

    pub(crate) fn opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.set(key, &value),
            None => self,
        }
    }

    pub(crate) fn into_pairs(self) -> Vec<(String, String)> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::Query;

    #[test]
    fn query_skips_absent_values() {
        let pairs = Query::new()
            .set("path", "/")
            .opt("limit", Some(20))
            .opt("offset", None::<u32>)
            .into_pairs();
        assert_eq!(
            pairs,
            vec![
                ("path".to_owned(), "/".to_owned()),
                ("limit".to_owned(), "20".to_owned()),
            ]
        );
    }

    #[test]
    fn query_set_borrows_any_displayable_value() {
        let owned = String::from("release notes");
        let pairs = Query::new().set("q", &owned).set("limit", &3).into_pairs();

        assert_eq!(owned, "release notes");
        assert_eq!(
            pairs,
            vec![
                ("q".to_owned(), "release notes".to_owned()),
                ("limit".to_owned(), "3".to_owned()),
            ]
        );
    }
}
