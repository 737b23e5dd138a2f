use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Default, Deserialize)]
pub struct CommentListQuery {
    pub task_id: Option<i64>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CommentCreateRequest {
    #[schema(example = 1)]
    pub task_id: i64,
    #[schema(example = "This looks good, but we need to add validation.")]
    pub comment_text: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CommentUpdateRequest {
    pub comment_text: String,
}
