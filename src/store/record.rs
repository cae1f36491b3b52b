//! 用户记录与记录集合
//!
//! 持久化文档的规范形状为 `{"last_id": N, "users": [...]}`；`last_id` 为历史上分配过的最大 id（高水位），
//! 为 0 时不写出。裸数组或缺少 `users` 键均视为损坏。

use serde::{Deserialize, Serialize};

/// 单条用户记录：id 由 store 分配，稳定且不复用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: u64,
    pub name: String,
    pub email: String,
}

/// 记录集合：读写的最小单位（整文件读-改-写），读取时保持插入顺序
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCollection {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub last_id: u64,
    pub users: Vec<UserRecord>,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

impl RecordCollection {
    pub fn new(users: Vec<UserRecord>) -> Self {
        Self { last_id: 0, users }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// 下一个可用 id：1 + max(高水位, 现存最大 id)；id 空间耗尽时为 None
    pub fn next_id(&self) -> Option<u64> {
        let max_existing = self.users.iter().map(|u| u.id).max().unwrap_or(0);
        self.last_id.max(max_existing).checked_add(1)
    }

    /// 追加一条记录并推进高水位
    pub fn push(&mut self, record: UserRecord) {
        self.last_id = self.last_id.max(record.id);
        self.users.push(record);
    }

    /// 按下标移除一条记录；高水位保留被删除的 id
    pub fn remove(&mut self, idx: usize) -> UserRecord {
        let removed = self.users.remove(idx);
        self.last_id = self.last_id.max(removed.id);
        removed
    }

    pub fn position(&self, id: u64) -> Option<usize> {
        self.users.iter().position(|u| u.id == id)
    }

    /// 大小写不敏感地查找占用该 email 的记录（可排除某个 id，用于 update）
    pub fn email_owner(&self, email: &str, except: Option<u64>) -> Option<&UserRecord> {
        let wanted = email.trim().to_lowercase();
        self.users
            .iter()
            .filter(|u| Some(u.id) != except)
            .find(|u| u.email.trim().to_lowercase() == wanted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: u64, email: &str) -> UserRecord {
        UserRecord {
            id,
            name: format!("user{id}"),
            email: email.to_string(),
        }
    }

    #[test]
    fn test_next_id_empty_and_gaps() {
        assert_eq!(RecordCollection::default().next_id(), Some(1));
        let c = RecordCollection::new(vec![user(1, "a@x.com"), user(5, "b@x.com"), user(3, "c@x.com")]);
        assert_eq!(c.next_id(), Some(6));
    }

    #[test]
    fn test_high_water_survives_delete_of_max() {
        let mut c = RecordCollection::default();
        c.push(user(1, "a@x.com"));
        c.push(user(2, "b@x.com"));
        c.users.retain(|u| u.id != 2);
        assert_eq!(c.next_id(), Some(3));
    }

    #[test]
    fn test_remove_records_high_water_for_legacy_documents() {
        let mut c = RecordCollection::new(vec![user(1, "a@x.com"), user(2, "b@x.com")]);
        assert_eq!(c.last_id, 0);
        let removed = c.remove(1);
        assert_eq!(removed.id, 2);
        assert_eq!(c.next_id(), Some(3));
    }

    #[test]
    fn test_next_id_at_u64_max_is_none() {
        let c = RecordCollection::new(vec![user(u64::MAX, "max@x.com")]);
        assert_eq!(c.next_id(), None);
        let c = RecordCollection { last_id: u64::MAX, users: vec![] };
        assert_eq!(c.next_id(), None);
    }

    #[test]
    fn test_email_owner_case_insensitive() {
        let c = RecordCollection::new(vec![user(1, "Bob@X.com"), user(2, "amy@x.com")]);
        assert_eq!(c.email_owner("bob@x.COM", None).map(|u| u.id), Some(1));
        assert!(c.email_owner(" BOB@x.com ", Some(1)).is_none());
        assert!(c.email_owner("zed@x.com", None).is_none());
    }

    #[test]
    fn test_document_shape() {
        let c = RecordCollection::new(vec![user(1, "a@x.com")]);
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"users": [{"id": 1, "name": "user1", "email": "a@x.com"}]})
        );
        assert!(serde_json::from_str::<RecordCollection>("[]").is_err());
        assert!(serde_json::from_str::<RecordCollection>("{}").is_err());
    }
}
