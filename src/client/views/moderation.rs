use log::info;

use crate::client::models::session::SessionReader;
use crate::client::models::ui_state::or_empty;
use crate::client::services::gateway::{AppealResolution, Gateway, ReportResolution, ReportTarget};
use crate::common::error::{ClientError, Result};
use crate::common::models::{Appeal, Report, VerificationRequest};

/// Report, verification and appeal queues. Only admin sessions can open it.
pub struct ModerationView {
    gateway: Gateway,
    reports: Vec<Report>,
    verifications: Vec<VerificationRequest>,
    appeals: Vec<Appeal>,
}

impl ModerationView {
    pub fn open(gateway: Gateway, viewer: &dyn SessionReader) -> Result<Self> {
        if !viewer.is_admin() {
            return Err(ClientError::Forbidden("moderation needs an admin account".to_string()));
        }
        Ok(Self {
            gateway,
            reports: Vec::new(),
            verifications: Vec::new(),
            appeals: Vec::new(),
        })
    }

    /// Each queue degrades to empty on its own
    pub async fn load(&mut self) {
        let (reports, verifications, appeals) = tokio::join!(
            self.gateway.admin_reports(),
            self.gateway.admin_verifications(),
            self.gateway.admin_appeals(),
        );
        self.reports = or_empty("reports", reports);
        self.verifications = or_empty("verifications", verifications);
        self.appeals = or_empty("appeals", appeals);
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn verifications(&self) -> &[VerificationRequest] {
        &self.verifications
    }

    pub fn appeals(&self) -> &[Appeal] {
        &self.appeals
    }

    /// Blocking takes the target down first: a post is hidden, an account
    /// blocked. Comments have no takedown and are only marked resolved.
    pub async fn resolve_report(&mut self, report_id: &str, resolution: ReportResolution) -> Result<()> {
        let report = self
            .reports
            .iter()
            .find(|r| r.id == report_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("report {}", report_id)))?;

        if resolution == ReportResolution::Block {
            match (ReportTarget::parse(&report.target_type), report.target_id.as_deref()) {
                (Some(ReportTarget::Post), Some(post_id)) => {
                    self.gateway.admin_hide_post(post_id).await?;
                }
                (Some(ReportTarget::User), Some(user_id)) => {
                    self.gateway.admin_block_user(user_id).await?;
                }
                _ => {}
            }
        }
        self.gateway.admin_resolve_report(&report.id, resolution).await?;
        info!("[MODERATION] report {} resolved as {:?}", report.id, resolution);
        self.reports = or_empty("reports", self.gateway.admin_reports().await);
        Ok(())
    }

    pub async fn approve_verification(&mut self, request_id: &str) -> Result<()> {
        self.gateway.admin_verify(request_id).await?;
        self.reload_verifications().await;
        Ok(())
    }

    pub async fn reject_verification(&mut self, request_id: &str) -> Result<()> {
        self.gateway.admin_reject_verify(request_id).await?;
        self.reload_verifications().await;
        Ok(())
    }

    async fn reload_verifications(&mut self) {
        self.verifications = or_empty("verifications", self.gateway.admin_verifications().await);
    }

    pub async fn resolve_appeal(&mut self, appeal_id: &str, resolution: AppealResolution) -> Result<()> {
        self.gateway.admin_resolve_appeal(appeal_id, resolution).await?;
        self.appeals = or_empty("appeals", self.gateway.admin_appeals().await);
        Ok(())
    }

    /// Lifts a moderation block outside the appeal flow
    pub async fn unblock_user(&self, user_id: &str) -> Result<()> {
        self.gateway.admin_unblock_user(user_id).await?;
        Ok(())
    }
}
