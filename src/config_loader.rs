use crate::config::AppConfig;
use log::{debug, error, info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use thiserror::Error;

/// 설정 로드 오류
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 파일 오류
    #[error("설정 파일 오류: {0}")]
    FileError(String),
    /// 파싱 오류
    #[error("설정 파싱 오류: {0}")]
    ParseError(String),
    /// 유효성 검사 오류
    #[error("설정 유효성 검사 오류: {0}")]
    ValidationError(String),
    /// 필수 환경 변수 누락
    #[error("환경 변수 누락: {0}")]
    MissingSecret(&'static str),
}

/// 설정 로드 결과
pub type ConfigResult<T> = Result<T, ConfigError>;

/// 설정 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON 형식
    Json,
    /// TOML 형식
    Toml,
    /// 자동 감지 (파일 확장자로부터)
    Auto,
}

/// 설정 유효성 검사 트레이트
pub trait ConfigValidation {
    /// 설정 유효성 검사
    fn validate(&self) -> ConfigResult<()>;
}

/// 텔레그램 봇 토큰 환경 변수
pub const TELEGRAM_TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";
/// CryptoPanic API 토큰 환경 변수
pub const CRYPTOPANIC_TOKEN_VAR: &str = "CRYPTOPANIC_API_TOKEN";

/// 설정 파일에 두지 않는 비밀 값
#[derive(Clone, Default)]
pub struct Secrets {
    pub telegram_token: String,
    /// 없으면 뉴스 채널이 비활성화됨
    pub cryptopanic_token: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("telegram_token", &"***")
            .field(
                "cryptopanic_token",
                &self.cryptopanic_token.as_ref().map(|_| "***"),
            )
            .finish()
    }
}

impl Secrets {
    /// 프로세스 환경 변수에서 비밀 값 로드
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 임의의 조회 함수로 비밀 값 로드
    ///
    /// # Arguments
    /// * `lookup` - 변수 이름을 받아 값을 돌려주는 함수
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let telegram_token = lookup(TELEGRAM_TOKEN_VAR)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingSecret(TELEGRAM_TOKEN_VAR))?;

        let cryptopanic_token = lookup(CRYPTOPANIC_TOKEN_VAR).filter(|v| !v.trim().is_empty());
        if cryptopanic_token.is_none() {
            warn!("{} 미설정: 뉴스 감성 채널 비활성화", CRYPTOPANIC_TOKEN_VAR);
        }

        Ok(Secrets {
            telegram_token,
            cryptopanic_token,
        })
    }
}

/// 설정 파일 로더
#[derive(Debug)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// 파일에서 설정 로드
    ///
    /// # Arguments
    /// * `path` - 설정 파일 경로
    /// * `format` - 설정 파일 형식 (Auto면 확장자로 판단)
    ///
    /// # Returns
    /// * `ConfigResult<T>` - 설정 객체 또는 오류
    pub fn load_from_file<T>(path: &Path, format: ConfigFormat) -> ConfigResult<T>
    where
        T: DeserializeOwned + ConfigValidation,
    {
        debug!("설정 파일 로드 시작: {}", path.display());

        let format = match format {
            ConfigFormat::Auto => Self::detect_format(path)?,
            other => other,
        };

        let content = std::fs::read_to_string(path).map_err(|e| {
            error!("설정 파일 읽기 실패: {} - {}", path.display(), e);
            ConfigError::FileError(format!("파일 읽기 실패: {}", e))
        })?;

        let config = Self::load_from_string(&content, format)?;
        info!("설정 파일 로드 완료: {}", path.display());
        Ok(config)
    }

    /// 문자열에서 설정 로드
    ///
    /// # Arguments
    /// * `content` - 설정 문자열
    /// * `format` - 설정 형식
    pub fn load_from_string<T>(content: &str, format: ConfigFormat) -> ConfigResult<T>
    where
        T: DeserializeOwned + ConfigValidation,
    {
        let config: T = match format {
            ConfigFormat::Json => Self::parse_json(content)?,
            ConfigFormat::Toml => Self::parse_toml(content)?,
            ConfigFormat::Auto => {
                // JSON으로 먼저 시도 후 실패하면 TOML 시도
                match Self::parse_json::<T>(content) {
                    Ok(config) => config,
                    Err(_) => Self::parse_toml(content)?,
                }
            }
        };

        if let Err(e) = config.validate() {
            error!("설정 유효성 검사 실패: {}", e);
            return Err(e);
        }

        Ok(config)
    }

    /// 애플리케이션 설정 로드
    ///
    /// 경로가 없으면 기본 설정을 사용합니다.
    pub fn load_app_config(path: Option<&Path>) -> ConfigResult<AppConfig> {
        match path {
            Some(path) => Self::load_from_file(path, ConfigFormat::Auto),
            None => {
                info!("설정 파일 미지정, 기본 설정 사용");
                let config = AppConfig::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// 설정 파일 저장
    ///
    /// # Arguments
    /// * `config` - 설정 객체
    /// * `path` - 저장할 파일 경로
    /// * `format` - 설정 파일 형식 (Auto면 확장자, 없으면 TOML)
    pub fn save_to_file<T>(config: &T, path: &Path, format: ConfigFormat) -> ConfigResult<()>
    where
        T: Serialize + ConfigValidation,
    {
        debug!("설정 파일 저장 시작: {}", path.display());

        let format = match format {
            ConfigFormat::Auto => Self::detect_format(path).unwrap_or(ConfigFormat::Toml),
            other => other,
        };

        let content = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(config)
                .map_err(|e| ConfigError::ParseError(format!("JSON 직렬화 실패: {}", e)))?,
            _ => toml::to_string_pretty(config)
                .map_err(|e| ConfigError::ParseError(format!("TOML 직렬화 실패: {}", e)))?,
        };

        std::fs::write(path, &content).map_err(|e| {
            error!("설정 파일 쓰기 실패: {} - {}", path.display(), e);
            ConfigError::FileError(format!("파일 쓰기 실패: {}", e))
        })?;

        info!("설정 파일 저장 완료: {}", path.display());
        Ok(())
    }

    fn parse_json<T: DeserializeOwned>(content: &str) -> ConfigResult<T> {
        serde_json::from_str(content).map_err(|e| {
            warn!("JSON 파싱 실패: {}", e);
            ConfigError::ParseError(format!("JSON 파싱 실패: {}", e))
        })
    }

    fn parse_toml<T: DeserializeOwned>(content: &str) -> ConfigResult<T> {
        toml::from_str(content).map_err(|e| {
            warn!("TOML 파싱 실패: {}", e);
            ConfigError::ParseError(format!("TOML 파싱 실패: {}", e))
        })
    }

    fn detect_format(path: &Path) -> ConfigResult<ConfigFormat> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(ConfigFormat::Json),
            Some("toml") => Ok(ConfigFormat::Toml),
            _ => {
                warn!("지원되지 않는 파일 형식: {}", path.display());
                Err(ConfigError::FileError(format!(
                    "파일 형식을 감지할 수 없음: {}",
                    path.display()
                )))
            }
        }
    }
}
