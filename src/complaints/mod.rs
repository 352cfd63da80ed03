//! Complaint endpoints and the views built on them.
//!
//! - [`ComplaintsApi`]: one method per endpoint
//! - [`ComplaintList`]: paged, filtered list view state
//! - [`DetailState`]: single complaint view state
//! - [`NewComplaint`] / [`ComplaintUpdate`]: multipart submissions

mod detail;
mod list;
mod submit;

pub use detail::DetailState;
pub use list::{ComplaintList, FetchOutcome, ListSnapshot};
pub use submit::{Attachment, ComplaintUpdate, NewComplaint};

use tracing::debug;

use crate::error::ClientError;
use crate::http::ApiClient;
use crate::models::complaint::{CreatedComplaint, UpdatedComplaint};
use crate::models::{Complaint, ComplaintPage, ComplaintSort, ComplaintStatus, DashboardStats};

/// Number of complaints shown in the recent-complaints preview.
pub const DEFAULT_PREVIEW_LIMIT: u32 = 3;

/// Parameters of a `GET /complaints` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplaintQuery {
    /// 1-based page number
    pub page: u32,
    pub status: Option<ComplaintStatus>,
    pub limit: Option<u32>,
    pub sort: Option<ComplaintSort>,
}

impl Default for ComplaintQuery {
    fn default() -> Self {
        Self {
            page: 1,
            status: None,
            limit: None,
            sort: None,
        }
    }
}

impl ComplaintQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn status(mut self, status: Option<ComplaintStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    pub fn sort(mut self, sort: Option<ComplaintSort>) -> Self {
        self.sort = sort;
        self
    }

    /// Query-string pairs. Unset filters are left out rather than sent empty.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", self.page.max(1).to_string())];
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(sort) = self.sort {
            params.push(("sort_by", sort.as_str().to_string()));
        }
        params
    }
}

#[derive(Debug, Clone)]
pub struct ComplaintsApi {
    api: ApiClient,
}

impl ComplaintsApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn client(&self) -> &ApiClient {
        &self.api
    }

    /// Fetch one page of complaints.
    pub async fn list(&self, query: &ComplaintQuery) -> Result<ComplaintPage, ClientError> {
        debug!(?query, "Listing complaints");
        let request = self.api.get("/complaints").query(&query.to_params());
        self.api.send_json(request).await
    }

    /// The most recent complaints for a summary view. Sends only `limit` and
    /// shares no state with any list view.
    pub async fn recent(&self, limit: u32) -> Result<Vec<Complaint>, ClientError> {
        let request = self.api.get("/complaints").query(&[("limit", limit)]);
        let page: ComplaintPage = self.api.send_json(request).await?;
        Ok(page.complaints)
    }

    pub async fn get(&self, id: &str) -> Result<Complaint, ClientError> {
        self.api
            .send_json(self.api.get(&format!("/complaints/{}", id)))
            .await
    }

    /// Load a complaint into a view state. A missing complaint becomes
    /// [`DetailState::NotFound`] rather than an error.
    pub async fn detail(&self, id: &str) -> DetailState {
        DetailState::load(self, id).await
    }

    /// Submit a new complaint as one multipart request.
    ///
    /// Takes the form by reference: on failure it is still there for a retry.
    pub async fn create(&self, form: &NewComplaint) -> Result<Complaint, ClientError> {
        let request = self.api.post("/complaints").multipart(form.to_form()?);
        let created: CreatedComplaint = self.api.send_json(request).await?;
        Ok(created.into_complaint())
    }

    /// Edit a complaint and optionally apply a status action.
    ///
    /// Returns the updated complaint when the server includes it.
    pub async fn update(
        &self,
        id: &str,
        update: &ComplaintUpdate,
    ) -> Result<Option<Complaint>, ClientError> {
        let request = self
            .api
            .put(&format!("/complaints/{}", id))
            .multipart(update.to_form()?);
        let updated: UpdatedComplaint = self.api.send_json(request).await?;
        Ok(updated.into_complaint())
    }

    /// Aggregate statistics over all complaints. Non-admins get a 403
    /// ([`ClientError::Api`]).
    pub async fn dashboard(&self) -> Result<DashboardStats, ClientError> {
        self.api.send_json(self.api.get("/dashboard/")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ComplaintAction;
    use crate::testing::{StubServer, ADMIN_TOKEN, VALID_TOKEN};

    async fn signed_in(server: &StubServer) -> ComplaintsApi {
        let (client, session) = server.client();
        session.store_token(VALID_TOKEN).unwrap();
        ComplaintsApi::new(client)
    }

    #[test]
    fn test_params_skip_unset_filters() {
        let params = ComplaintQuery::new().to_params();
        assert_eq!(params, vec![("page", "1".to_string())]);

        let params = ComplaintQuery::new()
            .page(3)
            .status(Some(ComplaintStatus::InProgress))
            .limit(Some(20))
            .sort(Some(ComplaintSort::UpdatedDesc))
            .to_params();
        assert_eq!(
            params,
            vec![
                ("page", "3".to_string()),
                ("status", "IN_PROGRESS".to_string()),
                ("limit", "20".to_string()),
                ("sort_by", "-updatedAt".to_string()),
            ]
        );
    }

    #[test]
    fn test_page_is_one_based() {
        assert_eq!(ComplaintQuery::new().page(0).page, 1);
    }

    #[tokio::test]
    async fn test_list_sends_page_and_status() {
        let server = StubServer::start().await;
        let api = signed_in(&server).await;

        let page = api
            .list(&ComplaintQuery::new().status(Some(ComplaintStatus::Open)))
            .await
            .unwrap();
        assert_eq!(page.complaints.len(), 1);
        assert_eq!(page.complaints[0].id, "c1");

        let sent = server.last_request("/complaints").unwrap();
        assert_eq!(sent.query.get("page").map(String::as_str), Some("1"));
        assert_eq!(sent.query.get("status").map(String::as_str), Some("OPEN"));
        assert_eq!(sent.authorization.as_deref(), Some("Bearer token-123"));
    }

    #[tokio::test]
    async fn test_recent_sends_only_limit() {
        let server = StubServer::start().await;
        let api = signed_in(&server).await;

        let recent = api.recent(DEFAULT_PREVIEW_LIMIT).await.unwrap();
        assert_eq!(recent.len(), 3);

        let sent = server.last_request("/complaints").unwrap();
        assert_eq!(sent.query.len(), 1);
        assert_eq!(sent.query.get("limit").map(String::as_str), Some("3"));
    }

    #[tokio::test]
    async fn test_get_existing_and_missing() {
        let server = StubServer::start().await;
        let api = signed_in(&server).await;

        let complaint = api.get("c2").await.unwrap();
        assert_eq!(complaint.status, ComplaintStatus::InProgress);

        let err = api.get("nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_create_sends_multipart_with_repeated_images() {
        let server = StubServer::start().await;
        let api = signed_in(&server).await;

        let form = NewComplaint {
            title: "Leaking hydrant".to_string(),
            description: "Water everywhere".to_string(),
            images: vec![
                Attachment::new("front.jpg", vec![1, 2, 3]),
                Attachment::new("side.png", vec![4, 5]),
            ],
        };
        let created = api.create(&form).await.unwrap();
        assert_eq!(created.title, "Leaking hydrant");
        assert_eq!(
            created.images,
            vec!["uploads/complaints/front.jpg", "uploads/complaints/side.png"]
        );

        let sent = server.last_request("/complaints").unwrap();
        assert!(sent
            .content_type
            .as_deref()
            .unwrap_or_default()
            .starts_with("multipart/form-data"));
        assert_eq!(sent.body["fields"]["title"][0], "Leaking hydrant");
        assert_eq!(sent.body["fields"]["description"][0], "Water everywhere");
        let files = sent.body["files"].as_array().unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f["field"] == "images"));
        assert_eq!(files[0]["content_type"], "image/jpeg");
        assert_eq!(files[1]["size"], 2);
    }

    #[tokio::test]
    async fn test_create_without_images() {
        let server = StubServer::start().await;
        let api = signed_in(&server).await;

        let form = NewComplaint::new("Graffiti", "On the library wall");
        let created = api.create(&form).await.unwrap();
        assert!(created.images.is_empty());
        assert!(server.last_request("/complaints").unwrap().body["files"]
            .as_array()
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_failed_create_keeps_form() {
        let server = StubServer::start().await;
        let api = signed_in(&server).await;

        let form = NewComplaint {
            title: "fail".to_string(),
            description: "kept".to_string(),
            images: vec![Attachment::new("a.gif", vec![7])],
        };
        let err = api.create(&form).await.unwrap_err();
        assert_eq!(err.user_message(), "Title rejected");

        // the same form can be submitted again unchanged
        assert_eq!(form.description, "kept");
        assert_eq!(form.images.len(), 1);
        assert!(api.create(&form).await.is_err());
        assert_eq!(server.requests_to("/complaints").len(), 2);
    }

    #[tokio::test]
    async fn test_update_with_action() {
        let server = StubServer::start().await;
        let api = signed_in(&server).await;

        let update = ComplaintUpdate {
            title: Some("Pothole (deep)".to_string()),
            action: Some(ComplaintAction::Start),
            remove_images: vec!["uploads/complaints/old.png".to_string()],
            ..Default::default()
        };
        let updated = api.update("c1", &update).await.unwrap().unwrap();
        assert_eq!(updated.title, "Pothole (deep)");
        assert_eq!(updated.status, ComplaintStatus::InProgress);

        let sent = server.last_request("/complaints/c1").unwrap();
        assert_eq!(sent.method, "PUT");
        assert_eq!(sent.body["fields"]["action"][0], "START");
        assert_eq!(sent.body["fields"]["remove_images"][0], "uploads/complaints/old.png");
        assert!(sent.body["fields"].get("description").is_none());
    }

    #[tokio::test]
    async fn test_dashboard_for_admin() {
        let server = StubServer::start().await;
        let (client, session) = server.client();
        session.store_token(ADMIN_TOKEN).unwrap();
        let api = ComplaintsApi::new(client);

        let stats = api.dashboard().await.unwrap();
        assert_eq!(stats.total_complaints, 4);
        assert_eq!(stats.count_for(ComplaintStatus::InProgress), 1);
        assert_eq!(stats.recent_complaints.len(), 4);
        assert_eq!(stats.completion_rate, 50.0);
        assert_eq!(server.last_request("/dashboard/").unwrap().method, "GET");
    }

    #[tokio::test]
    async fn test_dashboard_forbidden_for_citizen() {
        let server = StubServer::start().await;
        let api = signed_in(&server).await;

        let err = api.dashboard().await.unwrap_err();
        assert_eq!(err.status(), Some(reqwest::StatusCode::FORBIDDEN));
        assert_eq!(err.user_message(), "Admins only");
        assert!(api.client().session().has_token());
    }
}
