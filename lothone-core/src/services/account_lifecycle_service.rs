//! Account lifecycle service
//!
//! Coordinates create / edit / delete across the collection store, the proxy
//! daemon supervisor, the external SSTP service and the notification sink.
//!
//! One pass per request:
//! `Validating -> Locating -> Mutating -> Restarting -> Notifying -> Done`.
//! Any stage may end the pass with an error. A failed restart does not revert
//! a committed mutation; it is reported through [`AccountOutcome::restart`].

use std::fmt;
use std::sync::Arc;

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::types::{
    AccountCollection, AccountForm, AccountOutcome, AccountRecord, DeleteForm, DeleteTarget,
    DuplicatePolicy, EditMissPolicy, MutationRequest, Operation, Protocol, RequestContext,
    RestartOutcome, ValidatedAccount, ValidatedDelete,
};
use crate::utils::log_sanitizer::{mask_secret, truncate_for_log};
use crate::validation;

/// Stage of a lifecycle pass, used to label failures in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStage {
    Validating,
    Locating,
    Mutating,
    Restarting,
    Notifying,
    Done,
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validating => "validating",
            Self::Locating => "locating",
            Self::Mutating => "mutating",
            Self::Restarting => "restarting",
            Self::Notifying => "notifying",
            Self::Done => "done",
        })
    }
}

/// Logs a failed pass at `warn` for expected errors and `error` otherwise.
fn failed(operation: Operation, label: &str, stage: LifecycleStage, err: CoreError) -> CoreError {
    if err.is_expected() {
        log::warn!("[{label}] {operation} failed while {stage}: {err}");
    } else {
        log::error!("[{label}] {operation} failed while {stage}: {err}");
    }
    err
}

/// Lookup failures originate in the locating step of a store mutation.
fn store_stage(err: &CoreError) -> LifecycleStage {
    match err {
        CoreError::NotFound { .. } | CoreError::Conflict { .. } => LifecycleStage::Locating,
        _ => LifecycleStage::Mutating,
    }
}

/// Identifier shown in notifications: the id, or the masked credential for
/// credential-keyed records.
fn notice_key(record: &AccountRecord) -> String {
    if record.id.is_empty() {
        mask_secret(&record.password)
    } else {
        record.id.clone()
    }
}

/// 账户生命周期服务
pub struct AccountLifecycleService {
    ctx: Arc<ServiceContext>,
}

impl AccountLifecycleService {
    /// 创建账户生命周期服务实例
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    // ===== Form entry points =====

    /// Create an account from a console form
    pub async fn create_account(
        &self,
        request: &RequestContext,
        form: &AccountForm,
    ) -> CoreResult<AccountOutcome> {
        let account = validation::validate_account(form).map_err(|e| {
            failed(Operation::Create, &form.account_type, LifecycleStage::Validating, e)
        })?;
        self.execute(request, MutationRequest::Create(account)).await
    }

    /// Replace an account from a console form
    pub async fn edit_account(
        &self,
        request: &RequestContext,
        form: &AccountForm,
    ) -> CoreResult<AccountOutcome> {
        let account = validation::validate_account(form).map_err(|e| {
            failed(Operation::Edit, &form.account_type, LifecycleStage::Validating, e)
        })?;
        self.execute(request, MutationRequest::Edit(account)).await
    }

    /// Delete an account from a console form
    pub async fn delete_account(
        &self,
        request: &RequestContext,
        form: &DeleteForm,
    ) -> CoreResult<AccountOutcome> {
        let target = validation::validate_delete(form).map_err(|e| {
            failed(Operation::Delete, &form.account_type, LifecycleStage::Validating, e)
        })?;
        self.execute(request, MutationRequest::Delete(target)).await
    }

    /// Run one lifecycle pass for an already validated request
    pub async fn execute(
        &self,
        request: &RequestContext,
        mutation: MutationRequest,
    ) -> CoreResult<AccountOutcome> {
        log::info!(
            "[{}] {} requested by {}",
            mutation.protocol(),
            mutation.operation(),
            request.actor
        );
        let outcome = match mutation {
            MutationRequest::Create(account) => self.create(request, account).await?,
            MutationRequest::Edit(account) => self.edit(request, account).await?,
            MutationRequest::Delete(target) => self.delete(request, target).await?,
        };
        log::debug!(
            "[{}] {} {}",
            outcome.protocol,
            outcome.operation,
            LifecycleStage::Done
        );
        Ok(outcome)
    }

    // ===== Passes =====

    async fn create(
        &self,
        request: &RequestContext,
        account: ValidatedAccount,
    ) -> CoreResult<AccountOutcome> {
        let protocol = account.protocol;
        let label = protocol.as_str();
        let record = account.record;

        let restart = if protocol.is_file_backed() {
            let candidate = record.clone();
            let key = protocol.lookup_key(&record);
            let reject_duplicates = self.ctx.settings().duplicates == DuplicatePolicy::Reject;

            self.ctx
                .store()
                .mutate(
                    protocol,
                    Box::new(move |c: &mut AccountCollection| {
                        if let Some(key) = key.filter(|k| reject_duplicates && c.contains(k)) {
                            return Err(CoreError::Conflict {
                                protocol: protocol.to_string(),
                                key: key.to_string(),
                            });
                        }
                        c.push(candidate);
                        Ok(None)
                    }),
                )
                .await
                .map_err(|e| failed(Operation::Create, label, store_stage(&e), e))?;
            log::info!("[{label}] account appended for {}", record.username);

            self.restart(protocol).await
        } else {
            let response = self
                .ctx
                .external()
                .create_user(
                    &record.username,
                    &account.description,
                    &record.password,
                    record.expire_date,
                )
                .await
                .map_err(|e| failed(Operation::Create, label, LifecycleStage::Mutating, e))?;
            log::info!("[{label}] external create response: {}", truncate_for_log(&response));
            RestartOutcome::Skipped
        };

        let settings = self.ctx.settings();
        let message = format!(
            "{}@{} with [[{}]] is created by {}",
            record.username,
            settings.host_ip,
            notice_key(&record),
            request.actor
        );
        self.notify("New user is created", &message, &restart).await;

        Ok(AccountOutcome {
            operation: Operation::Create,
            protocol,
            record: Some(record),
            previous: None,
            persisted: true,
            restart,
        })
    }

    async fn edit(
        &self,
        request: &RequestContext,
        account: ValidatedAccount,
    ) -> CoreResult<AccountOutcome> {
        let protocol = account.protocol;
        let label = protocol.as_str();
        let record = account.record;

        let Some(key) = protocol.lookup_key(&record) else {
            let err = CoreError::UnsupportedProtocol {
                protocol: protocol.to_string(),
                operation: "account edit".to_string(),
            };
            return Err(failed(Operation::Edit, label, LifecycleStage::Locating, err));
        };

        let miss_policy = self.ctx.settings().edit_miss;
        let candidate = record.clone();
        let previous = self
            .ctx
            .store()
            .mutate(
                protocol,
                Box::new(move |c: &mut AccountCollection| {
                    match (c.replace(&key, candidate), miss_policy) {
                        (Some(old), _) => Ok(Some(old)),
                        (None, EditMissPolicy::Succeed) => Ok(None),
                        (None, EditMissPolicy::NotFound) => Err(CoreError::NotFound {
                            protocol: protocol.to_string(),
                            key: key.to_string(),
                        }),
                    }
                }),
            )
            .await
            .map_err(|e| failed(Operation::Edit, label, store_stage(&e), e))?;

        if previous.is_none() {
            log::warn!(
                "[{label}] edit matched no record for {}; reported as success",
                notice_key(&record)
            );
        }

        let settings = self.ctx.settings();
        let message = match &previous {
            Some(old) => format!(
                "{}@{} with \nid: [[{}]]\ndevice id: [[{}]]\n is updated by ({}) to {}\ndevice id: [[{}]]",
                old.username,
                settings.host_ip,
                notice_key(old),
                old.device_id,
                request.actor,
                record.username,
                record.device_id
            ),
            None => format!(
                "{}@{} with [[{}]] matched no existing user; edit by ({}) changed nothing",
                record.username,
                settings.host_ip,
                notice_key(&record),
                request.actor
            ),
        };
        let restart = RestartOutcome::Skipped;
        self.notify("User is updated", &message, &restart).await;

        Ok(AccountOutcome {
            operation: Operation::Edit,
            protocol,
            record: Some(record),
            previous,
            persisted: true,
            restart,
        })
    }

    async fn delete(
        &self,
        request: &RequestContext,
        target: ValidatedDelete,
    ) -> CoreResult<AccountOutcome> {
        let protocol = target.protocol;
        let label = protocol.as_str();
        let host_ip = self.ctx.settings().host_ip.clone();

        let (removed, restart, message) = match target.target {
            DeleteTarget::Record { key, device_id } => {
                let missing = CoreError::NotFound {
                    protocol: protocol.to_string(),
                    key: key.to_string(),
                };
                let lookup_miss = missing.clone();
                let removed = self
                    .ctx
                    .store()
                    .mutate(
                        protocol,
                        Box::new(move |c: &mut AccountCollection| {
                            c.remove(&key, &device_id)
                                .map(Some)
                                .ok_or(lookup_miss)
                        }),
                    )
                    .await
                    .and_then(|removed| removed.ok_or(missing))
                    .map_err(|e| failed(Operation::Delete, label, store_stage(&e), e))?;
                log::info!("[{label}] account removed for {}", removed.username);

                let restart = self.restart(protocol).await;
                let message = format!(
                    "{}@{host_ip} with [[{}]] is deleted by {}",
                    removed.username,
                    notice_key(&removed),
                    request.actor
                );
                (Some(removed), restart, message)
            }
            DeleteTarget::ExternalUser { username } => {
                let response = self
                    .ctx
                    .external()
                    .delete_user(&username)
                    .await
                    .map_err(|e| failed(Operation::Delete, label, LifecycleStage::Mutating, e))?;
                log::info!("[{label}] external delete response: {}", truncate_for_log(&response));

                let message = format!(
                    "{username}@{host_ip} SSTP server is deleted by {}",
                    request.actor
                );
                (None, RestartOutcome::Skipped, message)
            }
        };

        self.notify("Existing user is deleted.", &message, &restart)
            .await;

        Ok(AccountOutcome {
            operation: Operation::Delete,
            protocol,
            record: removed,
            previous: None,
            persisted: true,
            restart,
        })
    }

    // ===== Side effects =====

    /// Restart the proxy daemon. Never fails the pass.
    async fn restart(&self, protocol: Protocol) -> RestartOutcome {
        match self.ctx.coordinator().restart().await {
            Ok(()) => {
                log::info!("[{protocol}] service restarted");
                RestartOutcome::Succeeded
            }
            Err(e) => {
                log::error!(
                    "[{protocol}] {} failed: {e}; the saved change is kept",
                    LifecycleStage::Restarting
                );
                RestartOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn notify(&self, event: &str, message: &str, restart: &RestartOutcome) {
        let settings = self.ctx.settings();
        let mut title = format!("{} - {event}", settings.host_name);
        if matches!(restart, RestartOutcome::Failed { .. }) {
            title.push_str(" (service restart failed)");
        }
        log::debug!("{} {title}", LifecycleStage::Notifying);
        self.ctx
            .notifier()
            .notify(&title, message, settings.notification_priority)
            .await;
    }
}
