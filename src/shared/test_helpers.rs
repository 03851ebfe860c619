//! In-memory stand-ins for the database and the object store.
//!
//! They follow the constraints of the real schema (unique email, unique
//! name per owner, cascading deletes) so services can be exercised without
//! PostgreSQL or MinIO.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::core::config::JwtConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::model::{AuthenticatedUser, RefreshToken};
use crate::features::auth::repositories::RefreshTokenRepository;
use crate::features::files::models::{File, FileStatus, NewFile};
use crate::features::files::repositories::FileRepository;
use crate::features::users::models::User;
use crate::features::users::repositories::UserRepository;
use crate::modules::storage::ObjectStore;

pub const TEST_BUCKET: &str = "test-bucket";

pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test-secret-that-is-at-least-32-bytes-long".to_string(),
        access_ttl: std::time::Duration::from_secs(900),
        refresh_ttl: std::time::Duration::from_secs(7 * 24 * 3600),
        leeway: std::time::Duration::from_secs(0),
        bcrypt_cost: 4,
    }
}

#[derive(Default)]
struct DbState {
    users: Vec<User>,
    files: Vec<File>,
    refresh_tokens: Vec<RefreshToken>,
    next_user_id: i64,
    next_file_id: i64,
    ticks: i64,
}

impl DbState {
    /// Strictly increasing timestamps so ordering by creation time is deterministic
    fn now(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_default()
            + Duration::seconds(self.ticks)
    }

    fn user_id_for(&self, email: &str) -> Option<i64> {
        self.users.iter().find(|u| u.email == email).map(|u| u.id)
    }

    /// The user id, when the identity's email still belongs to it
    fn owner_id(&self, owner: &AuthenticatedUser) -> Option<i64> {
        self.users
            .iter()
            .find(|u| u.id == owner.user_id && u.email == owner.email)
            .map(|u| u.id)
    }

    fn owned_file_mut(&mut self, owner: &AuthenticatedUser, name: &str) -> Result<&mut File> {
        let owner = self.owner_id(owner).ok_or_else(file_not_found)?;
        self.files
            .iter_mut()
            .find(|f| f.user_id == owner && f.original_name == name)
            .ok_or_else(file_not_found)
    }
}

fn file_not_found() -> AppError {
    AppError::NotFound("File not found".to_string())
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

#[derive(Clone, Default)]
pub struct MemoryDb {
    state: Arc<Mutex<DbState>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user directly and return its identity
    pub fn seed_user(&self, email: &str) -> AuthenticatedUser {
        let mut state = self.state.lock().unwrap();
        state.next_user_id += 1;
        let id = state.next_user_id;
        let created_at = state.now();
        state.users.push(User {
            id,
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: email.to_string(),
            password_hash: String::new(),
            created_at,
        });
        AuthenticatedUser {
            user_id: id,
            email: email.to_string(),
        }
    }

    pub fn file_count(&self) -> usize {
        self.state.lock().unwrap().files.len()
    }

    pub fn refresh_token_count(&self) -> usize {
        self.state.lock().unwrap().refresh_tokens.len()
    }
}

#[async_trait]
impl UserRepository for MemoryDb {
    async fn create(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User> {
        let mut state = self.state.lock().unwrap();
        if state.user_id_for(email).is_some() {
            return Err(AppError::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }
        state.next_user_id += 1;
        let user = User {
            id: state.next_user_id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: state.now(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn get_by_email(&self, email: &str) -> Result<User> {
        let state = self.state.lock().unwrap();
        state
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(user_not_found)
    }

    async fn get_by_id(&self, id: i64) -> Result<User> {
        let state = self.state.lock().unwrap();
        state
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(user_not_found)
    }

    async fn update(
        &self,
        id: i64,
        first_name: &str,
        last_name: &str,
        password_hash: &str,
    ) -> Result<User> {
        let mut state = self.state.lock().unwrap();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(user_not_found)?;
        user.first_name = first_name.to_string();
        user.last_name = last_name.to_string();
        user.password_hash = password_hash.to_string();
        Ok(user.clone())
    }

    async fn update_email(&self, old_email: &str, new_email: &str) -> Result<User> {
        let mut state = self.state.lock().unwrap();
        let id = state.user_id_for(old_email).ok_or_else(user_not_found)?;
        if state.users.iter().any(|u| u.email == new_email && u.id != id) {
            return Err(AppError::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(user_not_found)?;
        user.email = new_email.to_string();
        Ok(user.clone())
    }

    async fn delete(&self, email: &str) -> Result<User> {
        let mut state = self.state.lock().unwrap();
        let index = state
            .users
            .iter()
            .position(|u| u.email == email)
            .ok_or_else(user_not_found)?;
        let user = state.users.remove(index);
        state.files.retain(|f| f.user_id != user.id);
        state.refresh_tokens.retain(|t| t.user_id != user.id);
        Ok(user)
    }
}

#[async_trait]
impl FileRepository for MemoryDb {
    async fn save(&self, file: NewFile) -> Result<File> {
        let mut state = self.state.lock().unwrap();
        if !state.users.iter().any(|u| u.id == file.user_id) {
            return Err(user_not_found());
        }
        if state
            .files
            .iter()
            .any(|f| f.user_id == file.user_id && f.original_name == file.original_name)
        {
            return Err(AppError::Conflict(
                "A file with this name already exists".to_string(),
            ));
        }
        state.next_file_id += 1;
        let now = state.now();
        let saved = File {
            id: state.next_file_id,
            user_id: file.user_id,
            original_name: file.original_name,
            mime_type: file.mime_type,
            size_in_bytes: file.size_in_bytes,
            s3_bucket: file.s3_bucket,
            s3_key: file.s3_key,
            status: FileStatus::Pending,
            created_at: now,
            updated_at: now,
            is_public: file.is_public,
        };
        state.files.push(saved.clone());
        Ok(saved)
    }

    async fn get_by_original_name_and_user_email(
        &self,
        owner: &AuthenticatedUser,
        original_name: &str,
    ) -> Result<File> {
        let mut state = self.state.lock().unwrap();
        state
            .owned_file_mut(owner, original_name)
            .map(|f| f.clone())
    }

    async fn get_readable_by_id(&self, viewer: &AuthenticatedUser, id: i64) -> Result<File> {
        let state = self.state.lock().unwrap();
        let viewer = state.owner_id(viewer);
        state
            .files
            .iter()
            .find(|f| f.id == id && (Some(f.user_id) == viewer || f.is_public))
            .cloned()
            .ok_or_else(file_not_found)
    }

    async fn get_owned_by_id(&self, owner: &AuthenticatedUser, id: i64) -> Result<File> {
        let state = self.state.lock().unwrap();
        let owner = state.owner_id(owner).ok_or_else(file_not_found)?;
        state
            .files
            .iter()
            .find(|f| f.id == id && f.user_id == owner)
            .cloned()
            .ok_or_else(file_not_found)
    }

    async fn list(&self, owner: &AuthenticatedUser) -> Result<Vec<File>> {
        let state = self.state.lock().unwrap();
        let Some(owner) = state.owner_id(owner) else {
            return Ok(Vec::new());
        };
        let mut files: Vec<File> = state
            .files
            .iter()
            .filter(|f| f.user_id == owner)
            .cloned()
            .collect();
        files.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(files)
    }

    async fn delete(&self, owner: &AuthenticatedUser, original_name: &str) -> Result<File> {
        let mut state = self.state.lock().unwrap();
        let id = state.owned_file_mut(owner, original_name)?.id;
        let index = state
            .files
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(file_not_found)?;
        Ok(state.files.remove(index))
    }

    async fn rename(
        &self,
        owner: &AuthenticatedUser,
        old_name: &str,
        new_name: &str,
        new_key: &str,
    ) -> Result<File> {
        let mut state = self.state.lock().unwrap();
        let (id, owner_id) = {
            let file = state.owned_file_mut(owner, old_name)?;
            (file.id, file.user_id)
        };
        if state
            .files
            .iter()
            .any(|f| f.user_id == owner_id && f.original_name == new_name && f.id != id)
        {
            return Err(AppError::Conflict(
                "A file with this name already exists".to_string(),
            ));
        }
        let now = state.now();
        let file = state.owned_file_mut(owner, old_name)?;
        file.original_name = new_name.to_string();
        file.s3_key = new_key.to_string();
        file.updated_at = now;
        Ok(file.clone())
    }

    async fn change_visibility(
        &self,
        owner: &AuthenticatedUser,
        original_name: &str,
        is_public: bool,
    ) -> Result<File> {
        let mut state = self.state.lock().unwrap();
        let now = state.now();
        let file = state.owned_file_mut(owner, original_name)?;
        file.is_public = is_public;
        file.updated_at = now;
        Ok(file.clone())
    }

    async fn set_status(
        &self,
        owner: &AuthenticatedUser,
        original_name: &str,
        status: FileStatus,
    ) -> Result<File> {
        let mut state = self.state.lock().unwrap();
        let now = state.now();
        let file = state.owned_file_mut(owner, original_name)?;
        file.status = status;
        file.updated_at = now;
        Ok(file.clone())
    }

    async fn mark_uploaded(
        &self,
        owner: &AuthenticatedUser,
        id: i64,
        actual_size: i64,
    ) -> Result<File> {
        let mut state = self.state.lock().unwrap();
        let owner = state.owner_id(owner).ok_or_else(file_not_found)?;
        let now = state.now();
        let file = state
            .files
            .iter_mut()
            .find(|f| f.id == id && f.user_id == owner)
            .ok_or_else(file_not_found)?;
        file.size_in_bytes = actual_size;
        file.status = FileStatus::Active;
        file.updated_at = now;
        Ok(file.clone())
    }

    async fn get_total_used_space(&self, owner: &AuthenticatedUser) -> Result<i64> {
        let state = self.state.lock().unwrap();
        let Some(owner) = state.owner_id(owner) else {
            return Ok(0);
        };
        Ok(state
            .files
            .iter()
            .filter(|f| f.user_id == owner)
            .map(|f| f.size_in_bytes)
            .sum())
    }
}

#[async_trait]
impl RefreshTokenRepository for MemoryDb {
    async fn create(
        &self,
        token_hash: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshToken> {
        let mut state = self.state.lock().unwrap();
        if state.refresh_tokens.iter().any(|t| t.id == token_hash) {
            return Err(AppError::Conflict(
                "Refresh token already exists".to_string(),
            ));
        }
        let token = RefreshToken {
            id: token_hash.to_string(),
            user_id,
            expires_at,
            created_at: Utc::now(),
            revoked: false,
        };
        state.refresh_tokens.push(token.clone());
        Ok(token)
    }

    async fn consume(&self, token_hash: &str) -> Result<Option<RefreshToken>> {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();
        Ok(state
            .refresh_tokens
            .iter_mut()
            .find(|t| t.id == token_hash && !t.revoked && t.expires_at > now)
            .map(|t| {
                t.revoked = true;
                t.clone()
            }))
    }

    async fn revoke(&self, token_hash: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        match state
            .refresh_tokens
            .iter_mut()
            .find(|t| t.id == token_hash && !t.revoked)
        {
            Some(token) => {
                token.revoked = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn revoke_all_for_user(&self, user_id: i64) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        let mut revoked = 0;
        for token in state
            .refresh_tokens
            .iter_mut()
            .filter(|t| t.user_id == user_id && !t.revoked)
        {
            token.revoked = true;
            revoked += 1;
        }
        Ok(revoked)
    }
}

/// Object store backed by a map; deletes can be made to fail
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    buckets: Arc<Mutex<HashSet<String>>>,
    fail_deletes: Arc<AtomicBool>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn remove(&self, key: &str) {
        self.objects.lock().unwrap().remove(key);
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn bucket_name(&self) -> String {
        TEST_BUCKET.to_string()
    }

    async fn save_file(&self, key: &str, data: Vec<u8>, _content_type: &str) -> Result<()> {
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn get_file(&self, key: &str) -> Result<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Object '{}' not found", key)))
    }

    async fn delete_file(&self, key: &str) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(AppError::Storage("delete failed".to_string()));
        }
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn copy_file(&self, from: &str, to: &str) -> Result<()> {
        let mut objects = self.objects.lock().unwrap();
        let data = objects
            .get(from)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Object '{}' not found", from)))?;
        objects.insert(to.to_string(), data);
        Ok(())
    }

    async fn create_bucket(&self, name: &str) -> Result<()> {
        if !self.buckets.lock().unwrap().insert(name.to_string()) {
            return Err(AppError::Conflict(format!("Bucket '{}' already exists", name)));
        }
        Ok(())
    }

    async fn delete_bucket(&self, name: &str) -> Result<()> {
        if !self.buckets.lock().unwrap().remove(name) {
            return Err(AppError::NotFound(format!("Bucket '{}' not found", name)));
        }
        Ok(())
    }
}
