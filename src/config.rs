use anyhow::Result;
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub redis: RedisConfig,
    pub openai: OpenAiConfig,
    pub generation: GenerationConfig,
    pub cache: CacheConfig,
    pub queue: QueueConfig,
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

impl ServerConfig {
    /// Bind address for the listener.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    /// Override for tests and proxies; defaults to the public API.
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    pub max_attempts: u32,
    pub base_delay_secs: u64,
    pub max_delay_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 2,
            max_delay_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// TTL for generated ad copy / SEO content.
    pub content_ttl_secs: u64,
    /// TTL for the redis mirror of job status records.
    pub job_ttl_secs: u64,
    pub memory_max_entries: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    pub worker_count: usize,
    /// Bound on a single bulk row (fetch + generate).
    pub row_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    /// Cap on extracted page text handed to the prompt builder.
    pub max_page_chars: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL")
                    .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
                enabled: env::var("REDIS_ENABLED")
                    .unwrap_or_else(|_| "true".to_string())
                    .parse()?,
            },
            openai: OpenAiConfig {
                api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
                model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                max_tokens: env::var("OPENAI_MAX_TOKENS")
                    .unwrap_or_else(|_| "1000".to_string())
                    .parse()?,
                base_url: env::var("OPENAI_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            },
            generation: GenerationConfig {
                max_attempts: env::var("MAX_RETRIES")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()?,
                base_delay_secs: env::var("RETRY_BASE_DELAY_SECS")
                    .unwrap_or_else(|_| "2".to_string())
                    .parse()?,
                max_delay_secs: env::var("RETRY_MAX_DELAY_SECS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
            },
            cache: CacheConfig {
                content_ttl_secs: env::var("CONTENT_CACHE_TTL")
                    .unwrap_or_else(|_| "7200".to_string())
                    .parse()?,
                job_ttl_secs: env::var("JOB_TTL_SECS")
                    .unwrap_or_else(|_| "86400".to_string())
                    .parse()?,
                memory_max_entries: env::var("CACHE_MAX_ENTRIES")
                    .unwrap_or_else(|_| "1000".to_string())
                    .parse()?,
            },
            queue: QueueConfig {
                worker_count: env::var("WORKER_COUNT")
                    .unwrap_or_else(|_| "2".to_string())
                    .parse()?,
                row_timeout_secs: env::var("ROW_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()?,
            },
            fetch: FetchConfig {
                timeout_secs: env::var("FETCH_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()?,
                max_page_chars: env::var("PAGE_MAX_CHARS")
                    .unwrap_or_else(|_| "2000".to_string())
                    .parse()?,
            },
        })
    }
}
