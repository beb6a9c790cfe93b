use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use ownerguard_core::review::{Review, ReviewState};

/// Thin client for the GitHub REST API, authenticated with the token the
/// Actions runtime provides.
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    token: String,
}

const PER_PAGE: usize = 100;

#[derive(Debug, Deserialize)]
struct FileEntry {
    filename: String,
}

#[derive(Debug, Deserialize)]
struct ReviewResponse {
    id: u64,
    user: UserResponse,
    state: ReviewState,
    submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    login: String,
}

#[derive(Debug, Deserialize)]
struct LabelResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RequestedReviewersResponse {
    users: Vec<UserResponse>,
}

#[derive(Debug, Serialize)]
struct RequestReviewersRequest<'a> {
    reviewers: &'a [String],
}

#[derive(Debug, Serialize)]
struct CreateReviewRequest<'a> {
    event: &'a str,
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct DismissReviewRequest<'a> {
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateCommentRequest<'a> {
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct UpdatePullRequestRequest<'a> {
    body: &'a str,
}

impl GitHubClient {
    pub fn new(token: String) -> Result<Self> {
        let client = Client::builder()
            .user_agent("ownerguard/0.1.0")
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self { client, token })
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
    }

    /// Every file touched by the pull request, across all pages. Removed
    /// files stay in the list: deleting an owned file still needs its
    /// owners' approval.
    pub async fn changed_files(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
    ) -> Result<Vec<String>> {
        info!(
            "Fetching changed files for PR #{} in {}/{}",
            pr_number, repo_owner, repo_name
        );

        let mut all_files = Vec::new();
        let mut page = 1;

        loop {
            let url = format!(
                "https://api.github.com/repos/{}/{}/pulls/{}/files?page={}&per_page={}",
                repo_owner, repo_name, pr_number, page, PER_PAGE
            );

            let response = self
                .get(&url)
                .send()
                .await
                .context("failed to send changed files request")?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response.text().await.unwrap_or_default();
                error!(
                    "GitHub API error fetching changed files: {} - {}",
                    status, error_text
                );
                return Err(anyhow!(
                    "GitHub API error fetching changed files: {} - {}",
                    status,
                    error_text
                ));
            }

            let files: Vec<FileEntry> = response
                .json()
                .await
                .context("failed to parse changed files response")?;
            let count = files.len();
            all_files.extend(files.into_iter().map(|file| file.filename));

            if count < PER_PAGE {
                break;
            }
            page += 1;
        }

        info!("Found {} changed files", all_files.len());
        Ok(all_files)
    }

    /// The complete review history of the pull request. All pages are
    /// merged here, before any reduction happens, so a reviewer's later
    /// decision can never be shadowed by one living on an earlier page.
    pub async fn reviews(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
    ) -> Result<Vec<Review>> {
        info!(
            "Fetching reviews for PR #{} in {}/{}",
            pr_number, repo_owner, repo_name
        );

        let mut all_reviews = Vec::new();
        let mut page = 1;

        loop {
            let url = format!(
                "https://api.github.com/repos/{}/{}/pulls/{}/reviews?page={}&per_page={}",
                repo_owner, repo_name, pr_number, page, PER_PAGE
            );

            let response = self
                .get(&url)
                .send()
                .await
                .context("failed to send reviews request")?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response.text().await.unwrap_or_default();
                error!(
                    "GitHub API error fetching reviews: {} - {}",
                    status, error_text
                );
                return Err(anyhow!(
                    "GitHub API error fetching reviews: {} - {}",
                    status,
                    error_text
                ));
            }

            let reviews: Vec<ReviewResponse> = response
                .json()
                .await
                .context("failed to parse reviews response")?;
            let count = reviews.len();
            all_reviews.extend(reviews.into_iter().map(|review| Review {
                id: review.id,
                reviewer: review.user.login,
                state: review.state,
                submitted_at: review.submitted_at,
            }));

            if count < PER_PAGE {
                break;
            }
            page += 1;
        }

        info!("Found {} reviews", all_reviews.len());
        Ok(all_reviews)
    }

    /// The identity this token acts as; reviews the bot submits show up
    /// under this login.
    pub async fn authenticated_login(&self) -> Result<String> {
        let response = self
            .get("https://api.github.com/user")
            .send()
            .await
            .context("failed to send authenticated user request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(
                "GitHub API error fetching authenticated user: {} - {}",
                status, error_text
            );
            return Err(anyhow!(
                "GitHub API error fetching authenticated user: {} - {}",
                status,
                error_text
            ));
        }

        let user: UserResponse = response
            .json()
            .await
            .context("failed to parse authenticated user response")?;

        info!("Acting as {}", user.login);
        Ok(user.login)
    }

    pub async fn labels(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
    ) -> Result<Vec<String>> {
        let url = format!(
            "https://api.github.com/repos/{}/{}/issues/{}/labels",
            repo_owner, repo_name, pr_number
        );

        let response = self
            .get(&url)
            .send()
            .await
            .context("failed to send labels request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(
                "GitHub API error fetching labels: {} - {}",
                status, error_text
            );
            return Err(anyhow!(
                "GitHub API error fetching labels: {} - {}",
                status,
                error_text
            ));
        }

        let labels: Vec<LabelResponse> = response
            .json()
            .await
            .context("failed to parse labels response")?;

        Ok(labels.into_iter().map(|label| label.name).collect())
    }

    /// Reviewers whose review is currently requested (and who have not
    /// reviewed yet).
    pub async fn requested_reviewers(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
    ) -> Result<Vec<String>> {
        let url = format!(
            "https://api.github.com/repos/{}/{}/pulls/{}/requested_reviewers",
            repo_owner, repo_name, pr_number
        );

        let response = self
            .get(&url)
            .send()
            .await
            .context("failed to send requested reviewers request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(
                "GitHub API error fetching requested reviewers: {} - {}",
                status, error_text
            );
            return Err(anyhow!(
                "GitHub API error fetching requested reviewers: {} - {}",
                status,
                error_text
            ));
        }

        let requested: RequestedReviewersResponse = response
            .json()
            .await
            .context("failed to parse requested reviewers response")?;

        Ok(requested.users.into_iter().map(|user| user.login).collect())
    }

    pub async fn request_reviewers(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
        reviewers: &[String],
    ) -> Result<()> {
        let url = format!(
            "https://api.github.com/repos/{}/{}/pulls/{}/requested_reviewers",
            repo_owner, repo_name, pr_number
        );

        info!(
            "Requesting reviews from {} on PR #{}",
            reviewers.join(", "),
            pr_number
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .json(&RequestReviewersRequest { reviewers })
            .send()
            .await
            .context("failed to send request reviewers request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(
                "GitHub API error requesting reviewers: {} - {}",
                status, error_text
            );
            return Err(anyhow!(
                "GitHub API error requesting reviewers: {} - {}",
                status,
                error_text
            ));
        }

        Ok(())
    }

    pub async fn approve(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
    ) -> Result<()> {
        let url = format!(
            "https://api.github.com/repos/{}/{}/pulls/{}/reviews",
            repo_owner, repo_name, pr_number
        );

        info!("Approving PR #{}", pr_number);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .json(&CreateReviewRequest {
                event: "APPROVE",
                body: "",
            })
            .send()
            .await
            .context("failed to send approval request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("GitHub API error approving PR: {} - {}", status, error_text);
            return Err(anyhow!(
                "GitHub API error approving PR: {} - {}",
                status,
                error_text
            ));
        }

        Ok(())
    }

    pub async fn dismiss_review(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
        review_id: u64,
        message: &str,
    ) -> Result<()> {
        let url = format!(
            "https://api.github.com/repos/{}/{}/pulls/{}/reviews/{}/dismissals",
            repo_owner, repo_name, pr_number, review_id
        );

        info!("Dismissing review {} on PR #{}", review_id, pr_number);

        let response = self
            .client
            .put(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .json(&DismissReviewRequest { message })
            .send()
            .await
            .context("failed to send dismiss review request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(
                "GitHub API error dismissing review: {} - {}",
                status, error_text
            );
            return Err(anyhow!(
                "GitHub API error dismissing review: {} - {}",
                status,
                error_text
            ));
        }

        Ok(())
    }

    pub async fn post_comment(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
        body: &str,
    ) -> Result<()> {
        let url = format!(
            "https://api.github.com/repos/{}/{}/issues/{}/comments",
            repo_owner, repo_name, pr_number
        );

        info!("Posting comment to PR #{}", pr_number);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .json(&CreateCommentRequest { body })
            .send()
            .await
            .context("failed to send comment request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(
                "GitHub API error posting comment: {} - {}",
                status, error_text
            );
            return Err(anyhow!(
                "GitHub API error posting comment: {} - {}",
                status,
                error_text
            ));
        }

        Ok(())
    }

    pub async fn update_pr_body(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
        body: &str,
    ) -> Result<()> {
        let url = format!(
            "https://api.github.com/repos/{}/{}/pulls/{}",
            repo_owner, repo_name, pr_number
        );

        info!("Updating body of PR #{}", pr_number);

        let response = self
            .client
            .patch(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .json(&UpdatePullRequestRequest { body })
            .send()
            .await
            .context("failed to send body update request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(
                "GitHub API error updating PR body: {} - {}",
                status, error_text
            );
            return Err(anyhow!(
                "GitHub API error updating PR body: {} - {}",
                status,
                error_text
            ));
        }

        Ok(())
    }
}
