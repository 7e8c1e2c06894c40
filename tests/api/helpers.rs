use account_server::configuration::{
    ApplicationSettings, DatabaseSettings, MediaSettings, Settings, TokenSettings,
};
use account_server::error::MediaError;
use account_server::media::{MediaHost, StagedFile};
use account_server::startup::run;
use account_server::store::InMemoryUserStore;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const PASSWORD: &str = "correct horse battery staple";

/// Media host double that hands back a predictable URL per upload
pub struct FakeMediaHost {
    uploads: AtomicUsize,
    reject: bool,
}

impl FakeMediaHost {
    pub fn accepting() -> Self {
        Self {
            uploads: AtomicUsize::new(0),
            reject: false,
        }
    }

    pub fn rejecting() -> Self {
        Self {
            uploads: AtomicUsize::new(0),
            reject: true,
        }
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaHost for FakeMediaHost {
    async fn upload(&self, file: &StagedFile) -> Result<String, MediaError> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        if self.reject {
            return Err(MediaError::Rejected(400));
        }
        assert!(file.path().exists(), "staged file must exist during upload");
        Ok(format!("https://media.test/{}/{}", n, file.file_name()))
    }
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub store: Arc<InMemoryUserStore>,
    pub media: Arc<FakeMediaHost>,
    pub upload_dir: PathBuf,
    pub static_root: PathBuf,
}

pub fn token_settings() -> TokenSettings {
    TokenSettings {
        access_token_secret: "integration-access-secret-0123456789".to_string(),
        access_token_expiry: 3600,
        refresh_token_secret: "integration-refresh-secret-0123456789".to_string(),
        refresh_token_expiry: 864000,
        issuer: "account_server".to_string(),
    }
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(token_settings(), FakeMediaHost::accepting())
}

pub fn spawn_app_with(tokens: TokenSettings, media: FakeMediaHost) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let root = std::env::temp_dir().join(format!("account_server_{}", uuid::Uuid::new_v4()));
    let static_root = root.join("public");
    let upload_dir = static_root.join("temp");
    std::fs::create_dir_all(&upload_dir).expect("Failed to create test directories");

    let settings = Settings {
        database: DatabaseSettings {
            username: "unused".to_string(),
            password: "unused".to_string(),
            port: 5432,
            host: "127.0.0.1".to_string(),
            database_name: "unused".to_string(),
        },
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port,
            body_limit_bytes: 16 * 1024,
            static_root: static_root.clone(),
            upload_dir: upload_dir.clone(),
        },
        tokens,
        media: MediaSettings {
            base_url: "http://127.0.0.1:1".to_string(),
            cloud_name: "test".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            timeout_ms: 1000,
        },
    };

    let store = Arc::new(InMemoryUserStore::new());
    let media = Arc::new(media);

    let server = run(listener, store.clone(), media.clone(), settings)
        .expect("Failed to build server");
    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        store,
        media,
        upload_dir,
        static_root,
    }
}

pub fn image_part(name: &str) -> Part {
    Part::bytes(b"\x89PNG fake image bytes".to_vec()).file_name(name.to_string())
}

pub fn registration_form(username: &str, email: &str) -> Form {
    Form::new()
        .text("fullName", "Test User")
        .text("email", email.to_string())
        .text("username", username.to_string())
        .text("password", PASSWORD)
        .part("avatar", image_part("avatar.png"))
}

/// First `name=value` pair set by the response for `name`
pub fn cookie_value(response: &reqwest::Response, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| {
            value
                .strip_prefix(prefix.as_str())
                .map(|rest| rest.split(';').next().unwrap_or_default().to_string())
        })
}

pub fn set_cookie_header(response: &reqwest::Response, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(prefix.as_str()))
        .map(str::to_string)
}

pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1/users{}", self.address, path)
    }

    pub async fn post_register(&self, form: Form) -> reqwest::Response {
        self.client
            .post(self.url("/register"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn register(&self, username: &str, email: &str) -> Value {
        let response = self.post_register(registration_form(username, email)).await;
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.unwrap()
    }

    pub async fn post_login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/login"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn login(&self, email: &str) -> Session {
        let response = self.post_login(email, PASSWORD).await;
        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.unwrap();
        Session {
            access_token: body["data"]["accessToken"].as_str().unwrap().to_string(),
            refresh_token: body["data"]["refreshToken"].as_str().unwrap().to_string(),
        }
    }

    pub async fn post_refresh(&self, refresh_token: &str) -> reqwest::Response {
        self.client
            .post(self.url("/refresh-token"))
            .json(&serde_json::json!({ "refreshToken": refresh_token }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn current_user(&self, access_token: &str) -> reqwest::Response {
        self.client
            .get(self.url("/current-user"))
            .bearer_auth(access_token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub fn staged_file_count(&self) -> usize {
        std::fs::read_dir(&self.upload_dir)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}
