use crate::domain::value_objects::MemberId;
use crate::ports::member_service::{Member, MemberService as MemberServiceTrait, Result};
use crate::ports::{HealthStatus, ServiceError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Mock implementation of MemberService
///
/// Supports stateful testing by storing registered members.
pub struct MemberService {
    members: Mutex<HashMap<MemberId, Member>>,
    down: AtomicBool,
}

impl MemberService {
    pub fn new() -> Self {
        Self {
            members: Mutex::new(HashMap::new()),
            down: AtomicBool::new(false),
        }
    }

    /// Registers a member and returns its id
    pub fn add_member(&self, name: &str) -> MemberId {
        let member = Member {
            id: MemberId::new(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        };
        let member_id = member.id;
        self.members.lock().unwrap().insert(member_id, member);
        member_id
    }

    /// Makes lookups fail with a transport error
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }
}

impl Default for MemberService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemberServiceTrait for MemberService {
    async fn get_by_id(&self, member_id: MemberId) -> Result<Option<Member>> {
        if self.down.load(Ordering::SeqCst) {
            return Err(ServiceError::failed("get_member_by_id", "connection refused"));
        }
        Ok(self.members.lock().unwrap().get(&member_id).cloned())
    }

    async fn health(&self) -> HealthStatus {
        if self.down.load(Ordering::SeqCst) {
            HealthStatus::degraded("User service unavailable")
        } else {
            HealthStatus::ok("User service is running")
        }
    }
}
