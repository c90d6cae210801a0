use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// 中继服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// 上游 Responses API 基础地址
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// 上游 API 密钥
    #[serde(default)]
    pub api_key: Option<String>,

    /// 上游项目/目录 ID，作为 `OpenAI-Project` 头发送，同时用于拼接模型 URI
    #[serde(default)]
    pub project: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// 静态页面目录
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// 示例 CSV 数据目录
    #[serde(default = "default_sample_data_dir")]
    pub sample_data_dir: String,

    /// HTTP 代理地址（可选）
    /// 支持格式: http://host:port, https://host:port, socks5://host:port
    #[serde(default)]
    pub proxy_url: Option<String>,

    /// 代理认证用户名（可选）
    #[serde(default)]
    pub proxy_username: Option<String>,

    /// 代理认证密码（可选）
    #[serde(default)]
    pub proxy_password: Option<String>,
}

/// 读取第一个存在的环境变量
fn first_env(keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| env::var(key).ok())
}

impl Config {
    /// 从环境变量覆盖配置
    pub fn override_from_env(&mut self) {
        if let Ok(host) = env::var("HOST") {
            self.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            if let Ok(p) = port.parse() {
                self.port = p;
            }
        }
        if let Ok(base_url) = env::var("UPSTREAM_BASE_URL") {
            self.base_url = base_url;
        }
        if let Some(api_key) = first_env(&["UPSTREAM_API_KEY", "YANDEX_API_KEY"]) {
            self.api_key = Some(api_key);
        }
        if let Some(project) = first_env(&["UPSTREAM_PROJECT", "YANDEX_FOLDER_ID"]) {
            self.project = Some(project);
        }
        if let Some(model) = first_env(&["UPSTREAM_MODEL", "YANDEX_CLOUD_MODEL"]) {
            self.model = model;
        }
        if let Ok(temperature) = env::var("TEMPERATURE") {
            if let Ok(t) = temperature.parse() {
                self.temperature = t;
            }
        }
        if let Ok(dir) = env::var("STATIC_DIR") {
            self.static_dir = dir;
        }
        if let Ok(dir) = env::var("SAMPLE_DATA_DIR") {
            self.sample_data_dir = dir;
        }
        if let Ok(proxy) = env::var("PROXY_URL") {
            self.proxy_url = Some(proxy);
        }
        if let Ok(username) = env::var("PROXY_USERNAME") {
            self.proxy_username = Some(username);
        }
        if let Ok(password) = env::var("PROXY_PASSWORD") {
            self.proxy_password = Some(password);
        }
    }

    /// 发送给上游的模型标识
    ///
    /// 配置了项目 ID 时为 `gpt://<project>/<model>`，否则直接使用模型名
    pub fn model_uri(&self) -> String {
        match self.project.as_deref().filter(|p| !p.is_empty()) {
            Some(project) => format!("gpt://{}/{}", project, self.model),
            None => self.model.clone(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_base_url() -> String {
    "https://ai.api.cloud.yandex.net/v1".to_string()
}

fn default_model() -> String {
    "qwen3-235b-a22b-fp8/latest".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_static_dir() -> String {
    "static".to_string()
}

fn default_sample_data_dir() -> String {
    "sample_data".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: default_base_url(),
            api_key: None,
            project: None,
            model: default_model(),
            temperature: default_temperature(),
            static_dir: default_static_dir(),
            sample_data_dir: default_sample_data_dir(),
            proxy_url: None,
            proxy_username: None,
            proxy_password: None,
        }
    }
}

impl Config {
    /// 获取默认配置文件路径
    pub fn default_config_path() -> &'static str {
        "config.json"
    }

    /// 从文件加载配置
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            // 配置文件不存在，返回默认配置
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }
}
