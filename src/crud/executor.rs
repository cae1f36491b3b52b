//! ActionExecutor：校验并执行 Action
//!
//! 每个 Action 的完整 读 -> 校验 -> 改 -> 写 区间都在同一次 `store.acquire()` 内完成，
//! id 分配与 email 唯一性检查因此与依赖它们的写入保持一致（无 TOCTOU）。
//! name / email 在存储与比较前去除首尾空白；email 唯一性按整串大小写不敏感比较。

use std::collections::HashSet;
use std::sync::Arc;

use crate::core::ServiceError;
use crate::crud::random::synthesize_identity;
use crate::intent::{Action, ActionKind};
use crate::store::{RecordStore, UserRecord};

/// 默认单次 bulk_create_random 上限
pub const DEFAULT_MAX_BULK: u64 = 1000;

/// 执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    Listed(Vec<UserRecord>),
    Created(UserRecord),
    Updated(UserRecord),
    Deleted(UserRecord),
    BulkCreated(Vec<UserRecord>),
}

impl ExecutionResult {
    pub fn kind(&self) -> ActionKind {
        match self {
            ExecutionResult::Listed(_) => ActionKind::List,
            ExecutionResult::Created(_) => ActionKind::Create,
            ExecutionResult::Updated(_) => ActionKind::Update,
            ExecutionResult::Deleted(_) => ActionKind::Delete,
            ExecutionResult::BulkCreated(_) => ActionKind::BulkCreateRandom,
        }
    }
}

/// Action 执行器：唯一的 CRUD 规则集
pub struct ActionExecutor {
    store: Arc<RecordStore>,
    max_bulk: u64,
}

impl ActionExecutor {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self {
            store,
            max_bulk: DEFAULT_MAX_BULK,
        }
    }

    pub fn with_max_bulk(mut self, max_bulk: u64) -> Self {
        self.max_bulk = max_bulk.max(1);
        self
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    pub async fn execute(&self, action: &Action) -> Result<ExecutionResult, ServiceError> {
        let result = match action {
            Action::List => self.list().await,
            Action::Create { name, email } => self.create(name, email).await,
            Action::Update { id, name, email } => {
                self.update(*id, name.as_deref(), email.as_deref()).await
            }
            Action::Delete { id } => self.delete(*id).await,
            Action::BulkCreateRandom { count } => self.bulk_create_random(*count).await,
            Action::None { .. } => Err(ServiceError::IntentParse(
                "'none' is not an executable action".to_string(),
            )),
        };
        match &result {
            Ok(r) => tracing::info!(action = r.kind().as_str(), "action executed"),
            Err(e) => tracing::warn!(action = action.kind().as_str(), kind = e.kind(), error = %e, "action rejected"),
        }
        result
    }

    async fn list(&self) -> Result<ExecutionResult, ServiceError> {
        let users = self.store.read().await?.users;
        Ok(ExecutionResult::Listed(users))
    }

    async fn create(&self, name: &str, email: &str) -> Result<ExecutionResult, ServiceError> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() || email.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "create requires name & email".to_string(),
            ));
        }

        let guard = self.store.acquire().await;
        let mut users = guard.read().await?;
        if users.email_owner(email, None).is_some() {
            return Err(ServiceError::Conflict(format!("Email already exists: {email}")));
        }
        let user = UserRecord {
            id: guard.next_id(&users)?,
            name: name.to_string(),
            email: email.to_string(),
        };
        users.push(user.clone());
        guard.write(&users).await?;
        Ok(ExecutionResult::Created(user))
    }

    async fn update(
        &self,
        id: u64,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<ExecutionResult, ServiceError> {
        let name = name.map(str::trim).filter(|s| !s.is_empty());
        let email = email.map(str::trim).filter(|s| !s.is_empty());

        let guard = self.store.acquire().await;
        let mut users = guard.read().await?;
        let idx = users
            .position(id)
            .ok_or_else(|| ServiceError::NotFound(format!("User not found: id {id}")))?;

        if let Some(new_email) = email {
            if users.email_owner(new_email, Some(id)).is_some() {
                return Err(ServiceError::Conflict(format!(
                    "Email already taken by another user: {new_email}"
                )));
            }
        }

        let record = &mut users.users[idx];
        let mut changed = false;
        if let Some(n) = name {
            changed |= record.name != n;
            record.name = n.to_string();
        }
        if let Some(e) = email {
            changed |= record.email != e;
            record.email = e.to_string();
        }
        let updated = record.clone();

        if changed {
            guard.write(&users).await?;
        }
        Ok(ExecutionResult::Updated(updated))
    }

    async fn delete(&self, id: u64) -> Result<ExecutionResult, ServiceError> {
        let guard = self.store.acquire().await;
        let mut users = guard.read().await?;
        let idx = users
            .position(id)
            .ok_or_else(|| ServiceError::NotFound(format!("User not found: id {id}")))?;
        let deleted = users.remove(idx);
        guard.write(&users).await?;
        Ok(ExecutionResult::Deleted(deleted))
    }

    async fn bulk_create_random(&self, count: u64) -> Result<ExecutionResult, ServiceError> {
        if count < 1 {
            return Err(ServiceError::InvalidArgument(
                "bulk_create_random requires positive integer count".to_string(),
            ));
        }
        if count > self.max_bulk {
            return Err(ServiceError::InvalidArgument(format!(
                "bulk_create_random count {count} exceeds the limit of {}",
                self.max_bulk
            )));
        }

        let guard = self.store.acquire().await;
        let mut users = guard.read().await?;
        let mut taken: HashSet<String> = users
            .users
            .iter()
            .map(|u| u.email.trim().to_lowercase())
            .collect();

        let mut created = Vec::with_capacity(count as usize);
        {
            let mut rng = rand::thread_rng();
            for _ in 0..count {
                let id = guard.next_id(&users)?;
                let (name, email) = synthesize_identity(&mut rng, &mut taken, id);
                let user = UserRecord { id, name, email };
                users.push(user.clone());
                created.push(user);
            }
        }

        guard.write(&users).await?;
        Ok(ExecutionResult::BulkCreated(created))
    }
}
