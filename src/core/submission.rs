//! Submission Service - the contact form pipeline
//!
//! Order is fixed: authenticity → validation → challenge → admin email →
//! (confirmation email ∥ newsletter sync). Every check that can reject runs
//! before the first side effect, so a rejected request sends nothing.
//!
//! Failure policy:
//! - admin email failure is request-fatal (`mail_send_failed`)
//! - confirmation email and newsletter failures are logged, never surfaced
//! - verifier outage fails closed (`challenge_invalid`)

use futures_util::future::join;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::nonce::NonceSigner;
use super::templates;
use super::validation::validate;
use crate::models::{
    AppError, AppResult, ContactConfig, ErrorCode, SubmissionOutcome, SubmissionRequest,
};
use crate::providers::{
    ChallengeVerifier, HttpMailer, LogMailer, Mailer, NewsletterSubscriber, SendyClient,
    TurnstileClient,
};

pub struct SubmissionService {
    config: Arc<ContactConfig>,
    nonces: NonceSigner,
    verifier: Option<Arc<dyn ChallengeVerifier>>,
    mailer: Arc<dyn Mailer>,
    newsletter: Option<Arc<dyn NewsletterSubscriber>>,
}

impl SubmissionService {
    /// Service without verifier or newsletter; attach them with the
    /// `with_*` methods.
    pub fn new(config: Arc<ContactConfig>, mailer: Arc<dyn Mailer>) -> Self {
        let nonces = NonceSigner::new(config.nonce_secret.clone(), config.nonce_lifetime_secs);
        Self {
            config,
            nonces,
            verifier: None,
            mailer,
            newsletter: None,
        }
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn ChallengeVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn with_newsletter(mut self, newsletter: Arc<dyn NewsletterSubscriber>) -> Self {
        self.newsletter = Some(newsletter);
        self
    }

    /// Wire the real providers selected by the configuration
    pub fn from_config(config: Arc<ContactConfig>) -> AppResult<Self> {
        let mailer: Arc<dyn Mailer> = match &config.mail {
            Some(relay) => Arc::new(HttpMailer::new(relay)?),
            None => Arc::new(LogMailer),
        };

        let mut service = Self::new(config.clone(), mailer);

        if let Some(challenge) = &config.challenge {
            service = service.with_verifier(Arc::new(TurnstileClient::new(challenge)?));
        }
        if let Some(newsletter) = &config.newsletter {
            service = service.with_newsletter(Arc::new(SendyClient::new(newsletter)?));
        }

        Ok(service)
    }

    pub fn config(&self) -> &ContactConfig {
        &self.config
    }

    pub fn nonces(&self) -> &NonceSigner {
        &self.nonces
    }

    /// Fresh anti-forgery token for a form
    pub fn issue_nonce(&self, action: &str) -> String {
        self.nonces.create(action)
    }

    /// Run one submission through the pipeline.
    ///
    /// `action` is the nonce action the request's token must be bound to.
    pub async fn handle(&self, request: SubmissionRequest, action: &str) -> AppResult<SubmissionOutcome> {
        let start = Instant::now();
        let submission_id = Uuid::new_v4();

        // 1. Authenticity
        let authentic = request
            .nonce
            .as_deref()
            .map(|nonce| self.nonces.verify(nonce, action))
            .unwrap_or(false);
        if !authentic {
            warn!(%submission_id, code = ErrorCode::AuthFailed.as_str(), "Rejected submission: bad or missing nonce");
            return Err(AppError::auth_failed());
        }

        // 2. Validation
        let submission = validate(&request, &self.config).map_err(|e| {
            info!(%submission_id, code = e.code_str(), reason = %e.message, "Rejected submission");
            e
        })?;

        // 3. Challenge
        self.check_challenge(&request, submission_id).await?;

        // 4. Admin notification
        let notification = templates::admin_notification(&submission, &self.config);
        if let Err(e) = self.mailer.send(&notification).await {
            error!(%submission_id, code = ErrorCode::MailSendFailed.as_str(), error = %e, "Admin notification failed");
            return Err(AppError::mail_send_failed(e));
        }

        // 5 + 6. Best-effort follow-ups
        let confirmation = templates::submitter_confirmation(&submission, &self.config);
        let (confirmation_result, ()) = join(
            self.mailer.send(&confirmation),
            self.sync_newsletter(&submission.email, &request, submission_id),
        )
        .await;
        if let Err(e) = confirmation_result {
            warn!(%submission_id, error = %e, "Confirmation email failed");
        }

        info!(
            %submission_id,
            subject = %submission.subject,
            latency_ms = %start.elapsed().as_millis(),
            "✅ Contact submission delivered"
        );

        Ok(SubmissionOutcome {
            message: self.config.success_message.clone(),
        })
    }

    async fn check_challenge(&self, request: &SubmissionRequest, submission_id: Uuid) -> AppResult<()> {
        if self.config.challenge.is_none() {
            return Ok(());
        }

        let token = request
            .challenge_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());
        let token = match token {
            Some(token) => token,
            None => {
                info!(%submission_id, code = ErrorCode::ChallengeRequired.as_str(), "Rejected submission: no challenge token");
                return Err(AppError::challenge_required());
            }
        };

        // Configured challenge without a verifier can never pass
        let verifier = match &self.verifier {
            Some(verifier) => verifier,
            None => {
                error!(%submission_id, "Challenge configured but no verifier attached");
                return Err(AppError::verifier_unreachable(eyre::eyre!("no verifier attached")));
            }
        };

        match verifier.verify(token, request.remote_ip.as_deref()).await {
            Ok(verification) if verification.success => Ok(()),
            Ok(verification) => {
                info!(
                    %submission_id,
                    code = ErrorCode::ChallengeInvalid.as_str(),
                    error_codes = ?verification.error_codes,
                    "Rejected submission: challenge failed"
                );
                Err(AppError::challenge_invalid())
            }
            Err(e) => {
                warn!(
                    %submission_id,
                    code = ErrorCode::VerifierUnreachable.as_str(),
                    error = %e,
                    "Rejected submission: verifier unavailable"
                );
                Err(AppError::verifier_unreachable(e))
            }
        }
    }

    async fn sync_newsletter(&self, email: &str, request: &SubmissionRequest, submission_id: Uuid) {
        let subscriber = match &self.newsletter {
            Some(subscriber) => subscriber,
            None => return,
        };
        let consent_needed = request.explicit_opt_in || self.config.newsletter_requires_consent;
        if consent_needed && !request.newsletter_consent {
            return;
        }

        if let Err(e) = subscriber.subscribe(email, &self.config.newsletter_list).await {
            warn!(
                %submission_id,
                code = ErrorCode::NewsletterFailed.as_str(),
                list = %self.config.newsletter_list,
                error = %e,
                "Newsletter sync failed"
            );
        }
    }
}
