//! In-memory stand-ins for the stores plus a request harness for route tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use bytes::Bytes;
use serde_json::Value;
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    app::build_app,
    auth::{
        jwt::JwtKeys,
        repo::UserRepo,
        repo_types::{ApprovalStatus, NewUser, User, UserRole},
    },
    config::{AdminBootstrap, AppConfig, JwtConfig},
    db::MAX_LIST_ROWS,
    error::RepoError,
    shifts::{
        repo::ShiftRepo,
        repo_types::{NewShift, Shift, ShiftFilter},
    },
    state::AppState,
    storage::{StorageClient, PUBLIC_PREFIX},
};

#[derive(Default)]
pub struct MemoryUserRepo {
    users: Mutex<Vec<User>>,
}

impl MemoryUserRepo {
    pub fn find(&self, email: &str) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned()
    }
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self.find(email))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, RepoError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(RepoError::DuplicateEmail);
        }
        let user = user.into_user(Uuid::new_v4(), OffsetDateTime::now_utc());
        users.push(user.clone());
        Ok(user)
    }

    async fn any_with_role(&self, role: UserRole) -> Result<bool, RepoError> {
        Ok(self.users.lock().unwrap().iter().any(|u| u.role == role))
    }

    async fn list_by_status(&self, status: ApprovalStatus) -> Result<Vec<User>, RepoError> {
        let mut rows: Vec<User> = self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.approval_status == status)
            .cloned()
            .collect();
        rows.sort_by_key(|u| u.created_at);
        rows.truncate(MAX_LIST_ROWS as usize);
        Ok(rows)
    }

    async fn set_approval(
        &self,
        id: Uuid,
        status: ApprovalStatus,
        approver: Option<Uuid>,
    ) -> Result<bool, RepoError> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(false);
        };
        user.approval_status = status;
        if let (ApprovalStatus::Approved, Some(admin_id)) = (status, approver) {
            user.approved_at = Some(OffsetDateTime::now_utc());
            user.approved_by = Some(admin_id);
        }
        Ok(true)
    }
}

#[derive(Default)]
pub struct MemoryShiftRepo {
    shifts: Mutex<Vec<Shift>>,
}

#[async_trait]
impl ShiftRepo for MemoryShiftRepo {
    async fn create(&self, shift: NewShift) -> Result<Shift, RepoError> {
        let shift = shift.into_shift(Uuid::new_v4(), OffsetDateTime::now_utc());
        self.shifts.lock().unwrap().push(shift.clone());
        Ok(shift)
    }

    async fn list_active(&self, filter: &ShiftFilter) -> Result<Vec<Shift>, RepoError> {
        let mut rows: Vec<Shift> = self
            .shifts
            .lock()
            .unwrap()
            .iter()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        rows.sort_by_key(|s| (s.shift_date, s.start_time, s.created_at));
        rows.truncate(MAX_LIST_ROWS as usize);
        Ok(rows)
    }

    async fn list_by_doctor(&self, doctor_id: Uuid) -> Result<Vec<Shift>, RepoError> {
        // newest insert first, even when timestamps tie
        let mut rows: Vec<Shift> = self
            .shifts
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|s| s.doctor_id == doctor_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(MAX_LIST_ROWS as usize);
        Ok(rows)
    }

    async fn deactivate(&self, shift_id: Uuid, doctor_id: Uuid) -> Result<bool, RepoError> {
        let mut shifts = self.shifts.lock().unwrap();
        match shifts
            .iter_mut()
            .find(|s| s.id == shift_id && s.doctor_id == doctor_id)
        {
            Some(s) => {
                s.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct FakeStorage {
    objects: Mutex<HashMap<String, Bytes>>,
}

impl FakeStorage {
    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }
}

#[async_trait]
impl StorageClient for FakeStorage {
    async fn put_object(&self, key: &str, body: Bytes, _ct: &str) -> anyhow::Result<String> {
        self.objects.lock().unwrap().insert(key.to_string(), body);
        Ok(format!("{}/{}", PUBLIC_PREFIX, key))
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".into(),
        jwt: JwtConfig {
            secret: "test-secret".into(),
            issuer: "doctorshift".into(),
            audience: "doctorshift-users".into(),
            ttl_minutes: 60,
        },
        upload_dir: PathBuf::from("uploads"),
        cors_origins: vec!["*".into()],
        admin: AdminBootstrap {
            email: "admin@doctorshift.com".into(),
            password: "admin123".into(),
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub users: Arc<MemoryUserRepo>,
    pub storage: Arc<FakeStorage>,
}

impl TestApp {
    pub fn new() -> Self {
        let users = Arc::new(MemoryUserRepo::default());
        let shifts = Arc::new(MemoryShiftRepo::default());
        let storage = Arc::new(FakeStorage::default());
        let state = AppState::from_parts(
            Arc::new(test_config()),
            users.clone(),
            shifts,
            storage.clone(),
        );
        Self {
            router: build_app(state.clone()),
            state,
            users,
            storage,
        }
    }

    pub fn token_for(&self, user_id: Uuid) -> String {
        JwtKeys::from(&self.state.config.jwt).sign(user_id).unwrap()
    }

    pub async fn seed_user(&self, email: &str, role: UserRole, status: ApprovalStatus) -> User {
        self.users
            .create(NewUser {
                email: email.into(),
                password_hash: "unused".into(),
                first_name: "Test".into(),
                last_name: "Doctor".into(),
                phone_number: "0812345678".into(),
                medical_license_number: "MD12345".into(),
                role,
                approval_status: status,
                license_image_path: None,
            })
            .await
            .unwrap()
    }

    pub async fn approved_doctor(&self, email: &str) -> (User, String) {
        let user = self
            .seed_user(email, UserRole::Doctor, ApprovalStatus::Approved)
            .await;
        let token = self.token_for(user.id);
        (user, token)
    }

    pub async fn pending_doctor(&self, email: &str) -> (User, String) {
        let user = self
            .seed_user(email, UserRole::Doctor, ApprovalStatus::Pending)
            .await;
        let token = self.token_for(user.id);
        (user, token)
    }

    pub async fn admin_token(&self) -> String {
        let admin = self
            .seed_user("root@doctorshift.com", UserRole::Admin, ApprovalStatus::Approved)
            .await;
        self.token_for(admin.id)
    }

    pub async fn register(&self, email: &str, password: &str) -> (StatusCode, Value) {
        send(
            &self.router,
            multipart_register(email, password, "card.png", "image/png"),
        )
        .await
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        send(&self.router, request(Method::GET, path, token, Body::empty())).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        send(&self.router, request(Method::DELETE, path, token, Body::empty())).await
    }

    pub async fn post_json(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut req = request(Method::POST, path, token, Body::from(body.to_string()));
        req.headers_mut().insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        send(&self.router, req).await
    }
}

fn request(method: Method, path: &str, token: Option<&str>, body: Body) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(body).unwrap()
}

const BOUNDARY: &str = "doctorshift-test-boundary";

/// A complete registration form with a tiny fake image attached.
pub fn multipart_register(
    email: &str,
    password: &str,
    file_name: &str,
    content_type: &str,
) -> Request<Body> {
    multipart_register_with_image(
        email,
        password,
        file_name,
        content_type,
        b"\x89PNG\r\n\x1a\nfake-image-bytes",
    )
}

pub fn multipart_register_with_image(
    email: &str,
    password: &str,
    file_name: &str,
    content_type: &str,
    image: &[u8],
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in [
        ("email", email),
        ("password", password),
        ("first_name", "Test"),
        ("last_name", "Doctor"),
        ("phone_number", "0812345678"),
        ("medical_license_number", "MD12345"),
    ] {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"license_image\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(image);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/api/register")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = router.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, json)
}
