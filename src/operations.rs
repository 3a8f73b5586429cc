use reqwest::Method;
use url::form_urlencoded::byte_serialize;

use crate::ClientError;
use crate::executor::ApiFamily;

/// Metadata for one `OpenAPI` operation.
///
/// Paths are relative to the family prefix (`/_api` or `/_api/v3`).
#[derive(Clone, Copy, Debug)]
pub struct OperationDefinition {
    /// Stable `OpenAPI` operation identifier.
    pub operation_id: &'static str,
    /// Uppercase HTTP method (for example `GET`, `POST`).
    pub method: &'static str,
    /// Path template, potentially containing `{param}` placeholders.
    pub path_template: &'static str,
    /// Required path parameter names extracted from `path_template`.
    pub path_params: &'static [&'static str],
}

const fn op(
    operation_id: &'static str,
    method: &'static str,
    path_template: &'static str,
    path_params: &'static [&'static str],
) -> OperationDefinition {
    OperationDefinition {
        operation_id,
        method,
        path_template,
        path_params,
    }
}

/// Endpoints under `/_api`.
pub static V1_OPERATIONS: &[OperationDefinition] = &[
    op("searchPages", "GET", "/search", &[]),
    op("listPages", "GET", "/pages.list", &[]),
    op("getPageTag", "GET", "/pages.getPageTag", &[]),
    op("updatePost", "GET", "/pages.updatePost", &[]),
    op("getComments", "GET", "/comments.get", &[]),
    op("addComment", "POST", "/comments.add", &[]),
    op("updateComment", "POST", "/comments.update", &[]),
    op("removeComment", "POST", "/comments.remove", &[]),
    op("searchTags", "GET", "/tags.search", &[]),
    op("updateTag", "POST", "/tags.update", &[]),
    op("listAttachments", "GET", "/attachments.list", &[]),
    op("removeAttachment", "POST", "/attachments.remove", &[]),
];

/// Endpoints under `/_api/v3`.
pub static V3_OPERATIONS: &[OperationDefinition] = &[
    op("getHealthcheck", "GET", "/healthcheck", &[]),
    op("getPage", "GET", "/page", &[]),
    op("createPage", "POST", "/page", &[]),
    op("updatePage", "PUT", "/page", &[]),
    op("getPageInfo", "GET", "/page/info", &[]),
    op("likePage", "PUT", "/page/likes", &[]),
    op("getRecentPages", "GET", "/pages/recent", &[]),
    op("listPages", "GET", "/pages/list", &[]),
    op("renamePage", "PUT", "/pages/rename", &[]),
    op("deletePages", "POST", "/pages/delete", &[]),
    op("listRevisions", "GET", "/revisions/list", &[]),
    op("getRevision", "GET", "/revisions/{id}", &["id"]),
    op("getBookmarks", "GET", "/bookmarks/{userId}", &["userId"]),
    op("getUserPages", "GET", "/users/{id}/recent", &["id"]),
    op("getPersonalSetting", "GET", "/personal-setting", &[]),
    op("searchPages", "GET", "/search", &[]),
];

impl ApiFamily {
    /// Operation catalog for this family.
    pub fn operations(self) -> &'static [OperationDefinition] {
        match self {
            Self::V1 => V1_OPERATIONS,
            Self::V3 => V3_OPERATIONS,
        }
    }
}

pub(crate) fn find_operation(
    family: ApiFamily,
    operation_id: &str,
) -> Result<&'static OperationDefinition, ClientError> {
    family
        .operations()
        .iter()
        .find(|op| op.operation_id == operation_id)
        .ok_or_else(|| ClientError::UnknownOperation(format!("{family}:{operation_id}")))
}

pub(crate) fn parse_method(operation: &OperationDefinition) -> Result<Method, ClientError> {
    Method::from_bytes(operation.method.as_bytes())
        .map_err(|_| ClientError::UnknownOperation(operation.operation_id.to_owned()))
}

pub(crate) fn render_path(
    operation: &OperationDefinition,
    path_params: &[(&str, &str)],
) -> Result<String, ClientError> {
    let mut rendered = operation.path_template.to_owned();

    for required_param in operation.path_params {
        let value = path_params
            .iter()
            .find(|(name, _)| name == required_param)
            .map(|(_, value)| *value)
            .ok_or_else(|| ClientError::MissingPathParameter {
                operation_id: operation.operation_id.to_owned(),
                parameter: (*required_param).to_owned(),
            })?;

        let placeholder = format!("{{{required_param}}}");
        rendered = rendered.replace(&placeholder, &encode_path_segment(value));
    }

    Ok(rendered)
}

fn encode_path_segment(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}
