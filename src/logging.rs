//! 日志系统模块
//!
//! 提供结构化日志配置和全局单次初始化

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock};
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter, Layer};

/// 全局日志初始化状态
#[derive(Debug)]
struct GlobalLoggingState {
    /// 是否已初始化
    initialized: bool,
    /// 初始化结果
    init_result: Result<(), String>,
}

impl Default for GlobalLoggingState {
    fn default() -> Self {
        Self {
            initialized: false,
            init_result: Ok(()),
        }
    }
}

/// 全局日志状态管理器
static GLOBAL_LOGGING_STATE: OnceLock<Mutex<GlobalLoggingState>> = OnceLock::new();

fn lock_state() -> MutexGuard<'static, GlobalLoggingState> {
    GLOBAL_LOGGING_STATE
        .get_or_init(|| Mutex::new(GlobalLoggingState::default()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// 日志配置结构
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 日志级别
    pub level: LevelFilter,
    /// 日志文件路径，设置后日志写入文件而不是 stderr
    pub file_path: Option<PathBuf>,
    /// 是否使用JSON格式
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            file_path: None,
            json_format: false,
        }
    }
}

/// 日志系统管理器
#[derive(Debug)]
pub struct LoggingSystem;

impl LoggingSystem {
    /// 初始化日志系统
    ///
    /// 重复调用不会重复安装 subscriber，直接返回第一次的结果
    ///
    /// # 参数
    /// * `config` - 日志配置
    ///
    /// # 返回
    /// * `Result<LoggingSystem, anyhow::Error>` - 初始化结果
    pub fn setup_logging(config: LogConfig) -> anyhow::Result<Self> {
        let mut state = lock_state();
        if state.initialized {
            return match &state.init_result {
                Ok(()) => Ok(Self),
                Err(e) => Err(anyhow::anyhow!("日志系统之前初始化失败: {}", e)),
            };
        }

        let init_result = Self::init_log_tracer().and_then(|()| Self::init_tracing_subscriber(&config));
        state.initialized = true;
        state.init_result = init_result.as_ref().map(|_| ()).map_err(|e| e.to_string());

        init_result.map(|()| Self)
    }

    /// 初始化 LogTracer，把依赖库通过 log 输出的记录转入 tracing
    fn init_log_tracer() -> anyhow::Result<()> {
        use tracing_log::LogTracer;

        static LOG_TRACER_INIT: OnceLock<Result<(), String>> = OnceLock::new();

        let result = LOG_TRACER_INIT.get_or_init(|| LogTracer::init().map_err(|e| e.to_string()));

        result
            .as_ref()
            .map_err(|e| anyhow::anyhow!("LogTracer初始化失败: {}", e))?;
        Ok(())
    }

    fn init_tracing_subscriber(config: &LogConfig) -> anyhow::Result<()> {
        let env_filter = EnvFilter::from_default_env().add_directive(Directive::from(config.level));

        let fmt_layer = match &config.file_path {
            Some(file_path) => {
                let file = std::fs::File::create(file_path)
                    .map_err(|e| anyhow::anyhow!("创建日志文件失败: {}", e))?;
                let layer = fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_timer(fmt::time::ChronoUtc::rfc_3339());
                if config.json_format {
                    layer.json().boxed()
                } else {
                    layer.boxed()
                }
            }
            // 日志写到 stderr，stdout 留给命令输出
            None if config.json_format => fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .with_file(true)
                .with_line_number(true)
                .boxed(),
            None => fmt::layer()
                .with_writer(std::io::stderr)
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .with_target(true)
                .boxed(),
        };

        match registry().with(env_filter).with(fmt_layer).try_init() {
            Ok(()) => {
                tracing::debug!("日志系统初始化完成: {:?}", config);
                Ok(())
            }
            Err(e) => {
                let error_msg = e.to_string();
                if error_msg.contains("already been set")
                    || error_msg.contains("already initialized")
                {
                    tracing::debug!("日志系统已经初始化过了");
                    Ok(())
                } else {
                    Err(anyhow::anyhow!("tracing subscriber初始化失败: {}", error_msg))
                }
            }
        }
    }

    /// 检查日志系统是否已初始化
    pub fn is_initialized() -> bool {
        lock_state().initialized
    }

    /// 重置日志系统状态（主要用于测试）
    #[cfg(test)]
    fn reset_for_testing() {
        let mut state = lock_state();
        state.initialized = false;
        state.init_result = Ok(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::NamedTempFile;

    #[test]
    #[serial]
    fn test_logging_system_single_initialization() {
        LoggingSystem::reset_for_testing();

        assert!(LoggingSystem::setup_logging(LogConfig::default()).is_ok());
        assert!(LoggingSystem::is_initialized());

        // 第二次初始化直接复用之前的结果
        let json = LogConfig {
            json_format: true,
            ..LogConfig::default()
        };
        assert!(LoggingSystem::setup_logging(json).is_ok());
    }

    #[test]
    #[serial]
    fn test_logging_system_with_file_output() {
        LoggingSystem::reset_for_testing();

        let temp_file = NamedTempFile::new().unwrap();
        let config = LogConfig {
            level: LevelFilter::DEBUG,
            file_path: Some(temp_file.path().to_path_buf()),
            json_format: false,
        };

        assert!(LoggingSystem::setup_logging(config).is_ok());
        assert!(LoggingSystem::is_initialized());
    }

    #[test]
    #[serial]
    fn test_unwritable_log_file_is_reported() {
        LoggingSystem::reset_for_testing();

        let config = LogConfig {
            file_path: Some(PathBuf::from("/nonexistent/halfpipe/halfpipe.log")),
            ..LogConfig::default()
        };
        assert!(LoggingSystem::setup_logging(config).is_err());
        // 失败结果被记住，后续调用返回同样的错误
        assert!(LoggingSystem::setup_logging(LogConfig::default()).is_err());

        LoggingSystem::reset_for_testing();
    }
}
