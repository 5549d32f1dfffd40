use crate::reflect::TypeName;
use thiserror::Error;

/// 容器操作的结果类型
pub type Result<T, E = ContainerError> = std::result::Result<T, E>;

/// 依赖注入容器错误
#[derive(Debug, Error)]
pub enum ContainerError {
    /// 带类型要求的必需参数既没有匹配的传入参数，也无法由容器创建
    #[error("Can not resolve dependency for parameter #{position} ${parameter} of \"{class}\"")]
    UnresolvableDependency {
        class: TypeName,
        position: usize,
        parameter: String,
        required: TypeName,
        #[source]
        source: Box<ContainerError>,
    },
    /// 无类型要求的必需参数没有剩余的传入参数
    #[error("No value supplied for parameter #{position} ${parameter} of \"{class}\"")]
    MissingArgument {
        class: TypeName,
        position: usize,
        parameter: String,
    },
    #[error("Required dependency \"{0}\" is no class or interface to satisfy")]
    UnknownDependency(TypeName),
    #[error("Required dependency \"{0}\" has no default class")]
    NoDefaultImplementation(TypeName),
    #[error("Can not change the factory of singleton \"{0}\", it is already instantiated")]
    LockedSingletonMutation(TypeName),
    #[error("Config key \"{0}\" is not set")]
    UnknownConfigKey(String),
    #[error("Config key \"{key}\" can not be read as {expected}: {source}")]
    ConfigType {
        key: String,
        expected: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Circular dependency detected: {}", format_chain(.chain))]
    CircularDependency { chain: Vec<TypeName> },
    #[error("Argument #{position} for \"{class}\" is not a {expected}")]
    ArgumentMismatch {
        class: TypeName,
        position: usize,
        expected: &'static str,
    },
    #[error("Instance of \"{class}\" is not a {expected}")]
    TypeMismatch { class: TypeName, expected: &'static str },
    /// 用户构造函数或工厂回调报告的失败
    #[error("Failed to create \"{class}\": {reason}")]
    CreationFailed { class: TypeName, reason: String },
}

impl ContainerError {
    /// 构造函数和回调中报告自定义失败
    pub fn creation_failed(class: impl Into<TypeName>, reason: impl Into<String>) -> Self {
        ContainerError::CreationFailed {
            class: class.into(),
            reason: reason.into(),
        }
    }
}

fn format_chain(chain: &[TypeName]) -> String {
    chain
        .iter()
        .map(TypeName::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}
